use crate::commands::Context;
use crate::credentials::{EncryptedFile, Environment};
use crate::error::Result;
use std::io::{self, Write};

/// Print the decrypted credentials of an environment
pub fn show(environment: Option<&str>) -> Result<()> {
    let context = Context::load()?;
    let environment = environment.map_or(Environment::Default, Environment::parse);

    let file = EncryptedFile::for_environment(&context.root, &environment, &context.keys);
    let plaintext = file.read()?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&plaintext)?;
    stdout.flush()?;
    Ok(())
}
