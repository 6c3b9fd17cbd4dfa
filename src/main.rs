fn main() -> anyhow::Result<()> {
    overlaid::run()?;
    Ok(())
}
