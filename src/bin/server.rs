// Tratamento de erros ergonômico
use anyhow::{Context, Result};

use std::io::IsTerminal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use vile_icmp::args::{self, Command, SERVER_OPTIONS};
use vile_icmp::listen::Listener;
use vile_icmp::sink::FileSink;
use vile_icmp::term::{Console, Palette};
use vile_icmp::transport::RawSocket;

const BANNER: &str = r"
____   ____.__.__         .____________     _____ __________
\   \ /   /|__|  |   ____ |   \_   ___ \   /     \\______   \
 \   Y   / |  |  | _/ __ \|   /    \  \/  /  \ /  \|     ___/
  \     /  |  |  |_\  ___/|   \     \____/    Y    \    |
   \___/   |__|____/\___  >___|\______  /\____|__  /____|
                        \/            \/         \/
";

/// Servidor: escuta ICMP até Ctrl+C.
/// Requer root ou CAP_NET_RAW (socket RAW).
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let config = match args::parse_server(std::env::args().skip(1))? {
        Command::Run(config) => config,
        Command::Help => {
            print!("{}", args::usage("vile-server", SERVER_OPTIONS));
            return Ok(());
        }
    };

    if std::io::stdout().is_terminal() {
        println!("{BANNER}");
    }

    // Configura handler para Ctrl+C
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Erro ao configurar handler de Ctrl+C")?;

    let sock = RawSocket::open().context("Falha ao criar socket RAW. Verifique se está rodando como root.")?;

    let sink = config.log.then(|| FileSink::new(&config.log_dir));
    if let Some(sink) = &sink {
        log::info!("registrando mensagens em {}", sink.dir().display());
    }

    let console = Console::new(Palette::for_stdout(), false);
    let mut listener = Listener::new(sock, config.respond, sink, console);

    let handled = listener
        .serve(&running, config.poll)
        .context("Socket RAW inutilizável")?;

    println!("\n{handled} pacotes tratados");

    Ok(())
}
