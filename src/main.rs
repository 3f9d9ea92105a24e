fn main() -> anyhow::Result<()> {
    name_tree::run()
}
