// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: registry configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Registry configuration file (TOML)")
}

fn build_cli() -> Command {
    Command::new("legacymod")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Retrofit legacy jars with module descriptors")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging (overridden by RUST_LOG)"),
        )
        .subcommand(
            Command::new("transform")
                .about("Turn legacy jars into modules")
                .arg(config_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("DIR")
                        .required(true)
                        .help("Directory for rewritten jars"),
                )
                .arg(
                    Arg::new("cache")
                        .long("cache")
                        .value_name("DIR")
                        .help("Directory for the persistent transform cache"),
                )
                .arg(
                    Arg::new("view")
                        .long("view")
                        .default_value("compileClasspath")
                        .help("Name of the view the jars are resolved for"),
                )
                .arg(
                    Arg::new("jars")
                        .required(true)
                        .num_args(1..)
                        .help("Jars to transform"),
                ),
        )
        .subcommand(
            Command::new("infer")
                .about("Show the module name and version inferred from archive names")
                .arg(Arg::new("ids").required(true).num_args(1..).help("Archive file names"))
                .arg(
                    Arg::new("extension")
                        .long("extension")
                        .default_value(".jar")
                        .help("Extension marker"),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show module information for a jar")
                .arg(Arg::new("jar").required(true).help("Jar to inspect"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print JSON instead of text"),
                ),
        )
        .subcommand(
            Command::new("check-config")
                .about("Validate a registry configuration file")
                .arg(Arg::new("config").required(true).help("Registry configuration file (TOML)")),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("legacymod.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
