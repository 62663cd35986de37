extern crate barberia_dormilona;

fn main() -> anyhow::Result<()> {
    // cualquier error (incluido el uso incorrecto) termina con código distinto de cero
    barberia_dormilona::run()?;
    Ok(())
}
