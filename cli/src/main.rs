use anyhow::Result;

fn main() -> Result<()> {
    solidoc_cli::run()
}
