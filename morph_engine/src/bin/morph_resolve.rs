//! 命令行：解析 Morph 文档并按保存模式输出

use clap::{Arg, ArgAction, ArgMatches, Command};
use morph_engine::document::write_document;
use morph_engine::resolver::set_config;
use morph_engine::{DirectorySource, Resolver, ResolverConfig, Result, SaveMode};

fn main() {
    let matches = Command::new("morph-resolve")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolve a morph document through its prototype chain.")
        .arg(
            Arg::new("root")
                .short('r')
                .long("root")
                .value_name("DIR")
                .default_value(".")
                .help("Directory the document identifiers are relative to")
        )
        .arg(
            Arg::new("identifier")
                .value_name("ID")
                .required(true)
                .help("Document identifier, e.g. heads/alice")
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .default_value("absolute")
                .help("Save mode (absolute, derivative, sibling)")
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Fail instead of resolving to an empty set when a document is missing")
        )
        .arg(
            Arg::new("include-orphans")
                .long("include-orphans")
                .action(ArgAction::SetTrue)
                .help("Keep morphs that the prototype does not declare")
        )
        .arg(
            Arg::new("delta")
                .long("delta")
                .action(ArgAction::SetTrue)
                .help("Write only the morphs that differ from the target prototype")
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Log every chain level")
        )
        .get_matches();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(&matches) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(matches: &ArgMatches) -> Result<String> {
    let root = matches.get_one::<String>("root").map(String::as_str).unwrap_or(".");
    let identifier = matches
        .get_one::<String>("identifier")
        .map(String::as_str)
        .unwrap_or_default();
    let mode: SaveMode = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("absolute")
        .parse()?;

    set_config(ResolverConfig {
        strict_mode: matches.get_flag("strict"),
        include_unmatched_child_records: matches.get_flag("include-orphans"),
        debug_log: matches.get_flag("debug"),
    });

    let resolver = Resolver::new(DirectorySource::new(root));
    let resolved = resolver.resolve(identifier)?;
    if matches.get_flag("delta") {
        resolver.write_delta(&resolved, mode)
    } else {
        write_document(&resolved, mode)
    }
}
