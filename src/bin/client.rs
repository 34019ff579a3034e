// Tratamento de erros ergonômico
use anyhow::{Context, Result};

use vile_icmp::args::{self, CLIENT_OPTIONS, Command};
use vile_icmp::dispatch::Dispatcher;
use vile_icmp::term::{Console, Palette};
use vile_icmp::transport::RawSocket;

/// Cliente: envia o payload em um ou mais Echo Requests.
/// Requer root ou CAP_NET_RAW (socket RAW).
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let config = match args::parse_client(std::env::args().skip(1))? {
        Command::Run(config) => config,
        Command::Help => {
            print!("{}", args::usage("vile-client", CLIENT_OPTIONS));
            return Ok(());
        }
    };

    // Payload lido antes de abrir o socket: nada é enviado se falhar
    let payload = config.source.load()?;

    let sock = RawSocket::open().context("Falha ao criar socket RAW. Verifique se está rodando como root.")?;

    let console = Console::new(Palette::for_stdout(), config.silent);
    let mut dispatcher = Dispatcher::new(sock, &config, console);

    log::debug!(
        "{} bytes para {} (id={}, padding={:?})",
        payload.len(),
        config.target,
        dispatcher.ident(),
        config.padding
    );

    let report = dispatcher
        .run(&payload)
        .with_context(|| format!("Falha ao enviar para {}", config.target))?;

    log::debug!("{} pacotes enviados", report.sent.len());

    Ok(())
}
