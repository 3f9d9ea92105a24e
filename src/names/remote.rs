//! PostgREST (Supabase) implementation of [`NameStore`].

use reqwest::{Url, header::AUTHORIZATION};
use serde_json::{Map, Value};

use crate::{
    config::StoreConfig,
    names::{Name, NameStore, StoreError, StoreFuture},
};

#[derive(Clone, Debug)]
pub struct RemoteNameStore {
    client: reqwest::Client,
    endpoint: Option<Endpoint>,
    column: String,
}

#[derive(Clone, Debug)]
struct Endpoint {
    table_url: Url,
    key: String,
}

impl RemoteNameStore {
    /// A store for `config`. A missing URL or key is not an error here: every
    /// call then fails with [`StoreError::NotConfigured`].
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        #[allow(unused_mut)]
        let mut builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        {
            builder = builder.timeout(config.timeout);
        }
        let client = builder.build()?;

        let endpoint = match (&config.url, &config.key) {
            (Some(url), Some(key)) => Some(Endpoint {
                table_url: table_url(url, &config.table)?,
                key: key.clone(),
            }),
            _ => {
                log::warn!("{}", StoreError::NotConfigured);
                None
            }
        };

        Ok(Self {
            client,
            endpoint,
            column: config.column.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    async fn fetch_names(self) -> Result<Vec<Name>, StoreError> {
        let endpoint = self.endpoint.ok_or(StoreError::NotConfigured)?;
        let mut url = endpoint.table_url;
        url.query_pairs_mut().append_pair("select", &self.column);

        let response = self
            .client
            .get(url)
            .header("apikey", &endpoint.key)
            .header(AUTHORIZATION, format!("Bearer {}", endpoint.key))
            .send()
            .await?;
        let body = checked_body(response).await?;
        let rows: Vec<Value> = serde_json::from_str(&body)?;
        let names = project_rows(&rows, &self.column);
        log::debug!("fetched {} of {} rows", names.len(), rows.len());
        Ok(names)
    }

    async fn insert_name(self, name: Name) -> Result<(), StoreError> {
        let endpoint = self.endpoint.ok_or(StoreError::NotConfigured)?;
        let body = insert_body(&self.column, &name);

        let response = self
            .client
            .post(endpoint.table_url)
            .header("apikey", &endpoint.key)
            .header(AUTHORIZATION, format!("Bearer {}", endpoint.key))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await?;
        checked_body(response).await?;
        log::debug!("stored {name:?}");
        Ok(())
    }
}

impl NameStore for RemoteNameStore {
    fn list_names(&self) -> StoreFuture<Vec<Name>> {
        Box::pin(self.clone().fetch_names())
    }

    fn add_name(&self, name: Name) -> StoreFuture<()> {
        Box::pin(self.clone().insert_name(name))
    }
}

fn table_url(base: &str, table: &str) -> Result<Url, StoreError> {
    let base = base.trim_end_matches('/');
    Url::parse(&format!("{base}/rest/v1/{table}")).map_err(|e| StoreError::InvalidUrl(e.to_string()))
}

async fn checked_body(response: reqwest::Response) -> Result<String, StoreError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Names from the `column` of each row. Rows without a string in that column
/// are skipped.
fn project_rows(rows: &[Value], column: &str) -> Vec<Name> {
    rows.iter()
        .filter_map(|row| row.get(column)?.as_str().map(Name::from))
        .collect()
}

fn insert_body(column: &str, name: &Name) -> Value {
    let mut row = Map::new();
    row.insert(column.to_string(), Value::String(name.as_str().to_string()));
    Value::Array(vec![Value::Object(row)])
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Config;

    #[test]
    fn rows_are_projected_in_order() {
        let rows = vec![
            json!({"nombres": "Ana"}),
            json!({"nombres": null}),
            json!({"other": "x"}),
            json!({"nombres": 7}),
            json!({"nombres": "Luis", "id": 3}),
        ];
        assert_eq!(
            project_rows(&rows, "nombres"),
            vec![Name::from("Ana"), Name::from("Luis")]
        );
    }

    #[test]
    fn insert_body_is_a_one_row_array() {
        assert_eq!(
            insert_body("nombres", &Name::from("Ana")),
            json!([{"nombres": "Ana"}])
        );
    }

    #[test]
    fn table_url_ignores_trailing_slashes() {
        let url = table_url("https://example.supabase.co/", "nombres_navidad").unwrap();
        assert_eq!(url.as_str(), "https://example.supabase.co/rest/v1/nombres_navidad");
    }

    #[test]
    fn bad_base_urls_are_reported() {
        assert!(matches!(
            table_url("not a url", "t"),
            Err(StoreError::InvalidUrl(_))
        ));
    }

    #[test]
    fn unconfigured_store_fails_every_call() {
        let store = RemoteNameStore::new(&Config::default().store).unwrap();
        assert!(!store.is_configured());
        let listed = futures::executor::block_on(store.list_names());
        assert!(matches!(listed, Err(StoreError::NotConfigured)));
        let added = futures::executor::block_on(store.add_name(Name::from("Ana")));
        assert!(matches!(added, Err(StoreError::NotConfigured)));
    }
}
