////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! `glbind --registry gl.xml --config glbind.toml --output src/gl.rs`
//!
//! The output file is only touched when the generated bindings differ from its current content,
//! so that builds depending on it are not invalidated needlessly.

#[macro_use]
extern crate log;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use glbind_generator::{GeneratorConfig, SymbolTable};

#[derive(Parser, Debug)]
#[clap(name = "glbind", version, about = "Generates Rust bindings from a GL registry")]
struct Cli {
    /// Registry XML file
    #[clap(long)]
    registry: PathBuf,

    /// Generator configuration (TOML); defaults apply without one
    #[clap(long)]
    config: Option<PathBuf>,

    /// File the bindings are written to
    #[clap(long)]
    output: PathBuf,

    /// Report out of date bindings instead of writing them
    #[clap(long)]
    check: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Written,
    Unchanged,
    OutOfDate,
}

fn generate(cli: &Cli) -> Result<Vec<u8>> {
    let config = match &cli.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::default(),
    };
    let symbols = SymbolTable::load(&cli.registry)?;
    debug!(
        "{}: {} constants, {} functions",
        cli.registry.display(),
        symbols.constants().len(),
        symbols.functions().len()
    );

    let mut generated = Vec::new();
    let bindings = glbind_generator::write_bindings(&symbols, config, &mut generated)
        .with_context(|| format!("failed to generate bindings from {}", cli.registry.display()))?;
    info!(
        "generated {} constants and {} bindings of {} functions",
        bindings.constants().len(),
        bindings.bindings().len(),
        bindings.functions().len()
    );
    Ok(generated)
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let generated = generate(cli)?;

    if read_existing(&cli.output)?.as_deref() == Some(generated.as_slice()) {
        return Ok(Outcome::Unchanged);
    }
    if cli.check {
        return Ok(Outcome::OutOfDate);
    }

    if let Some(parent) = cli.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&cli.output, &generated).with_context(|| format!("failed to write {}", cli.output.display()))?;
    Ok(Outcome::Written)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli)? {
        Outcome::Written => info!("wrote {}", cli.output.display()),
        Outcome::Unchanged => info!("{} is up to date", cli.output.display()),
        Outcome::OutOfDate => bail!("{} is out of date", cli.output.display()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const REGISTRY: &str = r#"
<registry>
    <enums namespace="GL">
        <enum value="0x8892" name="GL_ARRAY_BUFFER"/>
    </enums>
    <commands namespace="GL">
        <command>
            <proto>void <name>glBufferData</name></proto>
            <param><ptype>GLenum</ptype> <name>target</name></param>
            <param><ptype>GLsizeiptr</ptype> <name>size</name></param>
            <param>const void *<name>data</name></param>
            <param><ptype>GLenum</ptype> <name>usage</name></param>
        </command>
    </commands>
    <feature api="gl" name="GL_VERSION_1_5" number="1.5">
        <require>
            <enum name="GL_ARRAY_BUFFER"/>
            <command name="glBufferData"/>
        </require>
    </feature>
</registry>
"#;

    fn setup(config: Option<&str>) -> (TempDir, Cli) {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("gl.xml");
        fs::write(&registry, REGISTRY).unwrap();

        let config = config.map(|src| {
            let path = dir.path().join("glbind.toml");
            fs::write(&path, src).unwrap();
            path
        });

        let cli = Cli { registry, config, output: dir.path().join("out").join("gl.rs"), check: false };
        (dir, cli)
    }

    #[test]
    fn writes_once_then_leaves_the_file_alone() {
        let (_dir, cli) = setup(Some("buffer_object_functions = [\"glBufferData\"]"));

        assert_eq!(run(&cli).unwrap(), Outcome::Written);
        let written = fs::read_to_string(&cli.output).unwrap();
        assert!(written.contains("pub unsafe fn BufferData_offset("));
        assert!(written.contains("pub const ARRAY_BUFFER: types::GLenum = 0x8892;"));

        assert_eq!(run(&cli).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn check_mode_does_not_write() {
        let (_dir, mut cli) = setup(None);
        cli.check = true;

        assert_eq!(run(&cli).unwrap(), Outcome::OutOfDate);
        assert!(!cli.output.exists());

        cli.check = false;
        run(&cli).unwrap();
        cli.check = true;
        assert_eq!(run(&cli).unwrap(), Outcome::Unchanged);
    }

    #[test]
    fn bad_configuration_is_reported() {
        let (_dir, cli) = setup(Some("buffer_object_functions = [\"glBufferData\"]\nno_such_option = true"));
        assert!(run(&cli).is_err());
        assert!(!cli.output.exists());
    }

    #[test]
    fn parses_arguments() {
        let cli = Cli::try_parse_from(["glbind", "--registry", "gl.xml", "--output", "gl.rs", "--check"]).unwrap();
        assert_eq!(cli.registry, PathBuf::from("gl.xml"));
        assert!(cli.config.is_none());
        assert!(cli.check);
    }
}
