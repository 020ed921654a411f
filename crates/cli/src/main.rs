use anyhow::Result;

fn main() -> Result<()> {
    codefacts_cli::main_entry()
}
