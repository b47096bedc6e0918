use clap::Parser;
use fieldconf::{Conf, Configure, FlatSource};
use serde::Serialize;

/// Arguments an application parses itself before handing them over.
#[derive(Parser, Serialize, Debug)]
#[command(name = "svc")]
struct Cli {
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Configure, Default, Debug)]
pub struct Server {
    #[conf("default:localhost")]
    pub host: String,
    #[conf("default:8080,short:p")]
    pub port: u16,
    #[conf("default:info")]
    pub log_level: String,
}

fn resolve(argv: &[&str], env: &[(&str, &str)]) -> Server {
    let cli = Cli::parse_from(argv);
    let mut cfg = Server::default();
    Conf::builder()
        .args(["svc"])
        .env_vars(env.iter().copied())
        .source(FlatSource::from_serialize(&cli).unwrap())
        .parse(&mut cfg)
        .unwrap();
    cfg
}

#[test]
fn clap_values_act_as_lookup_source() {
    let cfg = resolve(&["svc", "--host", "example.org", "--log-level", "debug"], &[]);
    assert_eq!(cfg.host, "example.org");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.log_level, "debug");
}

#[test]
fn unset_clap_options_fall_through_to_defaults() {
    let cfg = resolve(&["svc"], &[]);
    assert_eq!(cfg.host, "localhost");
    assert_eq!(cfg.log_level, "info");
}

#[test]
fn environment_beats_clap_source() {
    let cfg = resolve(&["svc", "-p", "9000"], &[("PORT", "9100")]);
    assert_eq!(cfg.port, 9100);
}

#[test]
fn closure_source() {
    let mut cfg = Server::default();
    Conf::builder()
        .args(["svc"])
        .env_vars(Vec::<(String, String)>::new())
        .source(|field: &fieldconf::Field| (field.flag_name == "log-level").then(|| "warn".to_string()))
        .parse(&mut cfg)
        .unwrap();
    assert_eq!(cfg.log_level, "warn");
}
