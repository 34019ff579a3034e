use std::fmt::Write as _;
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::fragment::Padding;

/// Uma opção de linha de comando: nome, valor esperado (se houver) e ajuda.
#[derive(Debug, Clone, Copy)]
pub struct OptSpec {
    pub flag: &'static str,
    pub value: Option<&'static str>,
    pub help: &'static str,
}

const fn flag(flag: &'static str, help: &'static str) -> OptSpec {
    OptSpec { flag, value: None, help }
}

const fn valued(flag: &'static str, value: &'static str, help: &'static str) -> OptSpec {
    OptSpec { flag, value: Some(value), help }
}

pub const CLIENT_OPTIONS: &[OptSpec] = &[
    valued("-t", "<IP>", "IP de destino (padrão: 127.0.0.1)"),
    valued("-m", "<msg>", "Envia a mensagem como payload"),
    valued("-f", "<file>", "Envia o conteúdo do arquivo como payload"),
    flag("-s", "Modo silencioso (sem saída no console)"),
    flag("-nr", "Não espera resposta do servidor"),
    flag("-pl", "Blocos de 56 bytes com padding (estilo Linux)"),
    flag("-pw", "Blocos de 32 bytes com padding (estilo Windows)"),
    valued("-w", "<secs>", "Tempo máximo de espera pela resposta, 0 = sem limite (padrão: 5)"),
    flag("-h", "Mostra esta ajuda e sai"),
];

pub const SERVER_OPTIONS: &[OptSpec] = &[
    flag("-r", "Responde com ICMP Echo Reply"),
    flag("-l", "Registra as mensagens em client_<ip>.txt"),
    valued("-d", "<dir>", "Diretório dos registros (padrão: .)"),
    valued("-w", "<secs>", "Intervalo de verificação do Ctrl+C (padrão: 1)"),
    flag("-h", "Mostra esta ajuda e sai"),
];

pub const DEFAULT_TARGET: Ipv4Addr = Ipv4Addr::LOCALHOST;
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL: Duration = Duration::from_secs(1);

/// Resultado do parsing: executar ou só mostrar a ajuda.
#[derive(Debug)]
pub enum Command<T> {
    Run(T),
    Help,
}

/// De onde vem o payload do cliente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadSource {
    Literal(String),
    File(PathBuf),
}

impl Default for PayloadSource {
    fn default() -> Self {
        PayloadSource::Literal(String::new())
    }
}

impl PayloadSource {
    pub fn load(&self) -> Result<Vec<u8>, ConfigError> {
        match self {
            PayloadSource::Literal(s) => Ok(s.clone().into_bytes()),
            PayloadSource::File(path) => fs::read(path).map_err(|source| ConfigError::UnreadableFile {
                path: path.clone(),
                source,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub target: Ipv4Addr,
    pub source: PayloadSource,
    pub silent: bool,
    pub no_response: bool,
    pub padding: Padding,
    /// `None` espera indefinidamente.
    pub reply_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub respond: bool,
    pub log: bool,
    pub log_dir: PathBuf,
    pub poll: Duration,
}

/// Percorre os argumentos conforme o esquema, na ordem em que aparecem.
fn scan<I>(args: I, schema: &'static [OptSpec]) -> Result<Vec<(&'static str, Option<String>)>, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        let spec = schema
            .iter()
            .find(|s| s.flag == arg)
            .ok_or_else(|| ConfigError::UnknownFlag(arg.clone()))?;

        let value = match spec.value {
            Some(_) => Some(args.next().ok_or(ConfigError::MissingValue(spec.flag))?),
            None => None,
        };
        out.push((spec.flag, value));
    }

    Ok(out)
}

fn parse_secs(raw: &str) -> Result<u64, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidTimeout(raw.to_string()))
}

pub fn parse_client<I>(args: I) -> Result<Command<ClientConfig>, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let opts = scan(args, CLIENT_OPTIONS)?;
    if opts.iter().any(|(f, _)| *f == "-h") {
        return Ok(Command::Help);
    }

    let mut cfg = ClientConfig {
        target: DEFAULT_TARGET,
        source: PayloadSource::default(),
        silent: false,
        no_response: false,
        padding: Padding::None,
        reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
    };
    let mut message = None;
    let mut file = None;

    for (flag, value) in opts {
        let value = value.unwrap_or_default();
        match flag {
            "-t" => {
                cfg.target = value.parse().map_err(|_| ConfigError::InvalidTarget(value))?;
            }
            "-m" => message = Some(value),
            "-f" => file = Some(PathBuf::from(value)),
            "-s" => cfg.silent = true,
            "-nr" => cfg.no_response = true,
            // -pl e -pw são exclusivos: vale o último
            "-pl" => cfg.padding = Padding::Linux,
            "-pw" => cfg.padding = Padding::Windows,
            "-w" => {
                let secs = parse_secs(&value)?;
                cfg.reply_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            _ => {}
        }
    }

    // -f tem precedência sobre -m
    cfg.source = match (file, message) {
        (Some(path), _) => PayloadSource::File(path),
        (None, Some(msg)) => PayloadSource::Literal(msg),
        (None, None) => PayloadSource::default(),
    };

    Ok(Command::Run(cfg))
}

pub fn parse_server<I>(args: I) -> Result<Command<ServerConfig>, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let opts = scan(args, SERVER_OPTIONS)?;
    if opts.iter().any(|(f, _)| *f == "-h") {
        return Ok(Command::Help);
    }

    let mut cfg = ServerConfig {
        respond: false,
        log: false,
        log_dir: PathBuf::from("."),
        poll: DEFAULT_POLL,
    };

    for (flag, value) in opts {
        let value = value.unwrap_or_default();
        match flag {
            "-r" => cfg.respond = true,
            "-l" => cfg.log = true,
            "-d" => cfg.log_dir = PathBuf::from(value),
            "-w" => match parse_secs(&value)? {
                0 => return Err(ConfigError::InvalidTimeout(value)),
                secs => cfg.poll = Duration::from_secs(secs),
            },
            _ => {}
        }
    }

    Ok(Command::Run(cfg))
}

/// Texto de ajuda gerado a partir do esquema.
pub fn usage(program: &str, schema: &[OptSpec]) -> String {
    let mut out = format!("Uso: {program} [opções]\n\nOpções:\n");
    for spec in schema {
        let head = match spec.value {
            Some(v) => format!("{} {}", spec.flag, v),
            None => spec.flag.to_string(),
        };
        let _ = writeln!(out, "  {head:<12}{}", spec.help);
    }
    out
}
