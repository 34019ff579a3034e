//! Uma execução do cliente: fragmenta, envia cada bloco e opcionalmente
//! espera uma resposta.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::thread;
use std::time::{Duration, Instant};

use crate::args::ClientConfig;
use crate::error::DispatchError;
use crate::fragment::{self, PACING, Padding};
use crate::icmp;
use crate::term::{self, Console};
use crate::transport::{self, IcmpTransport, RECV_BUF_LEN};

/// O que aconteceu numa execução.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Sequências enviadas, na ordem.
    pub sent: Vec<u16>,
    /// Quantas pausas entre fragmentos foram feitas.
    pub pauses: usize,
    /// Origem da resposta, se esperamos por uma.
    pub reply_from: Option<SocketAddr>,
}

pub struct Dispatcher<T> {
    transport: T,
    target: Ipv4Addr,
    ident: u16,
    padding: Padding,
    no_response: bool,
    reply_timeout: Option<Duration>,
    pacing: Duration,
    console: Console,
}

impl<T: IcmpTransport> Dispatcher<T> {
    pub fn new(transport: T, config: &ClientConfig, console: Console) -> Self {
        Dispatcher {
            transport,
            target: config.target,
            // Identificador: usa o PID do processo (comum em pings)
            ident: std::process::id() as u16,
            padding: config.padding,
            no_response: config.no_response,
            reply_timeout: config.reply_timeout,
            pacing: PACING,
            console,
        }
    }

    pub fn with_ident(mut self, ident: u16) -> Self {
        self.ident = ident;
        self
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn ident(&self) -> u16 {
        self.ident
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn run(&mut self, payload: &[u8]) -> Result<RunReport, DispatchError> {
        let dst = SocketAddr::new(IpAddr::V4(self.target), 0);
        let palette = self.console.palette;
        let mut report = RunReport::default();
        let mut seq: u16 = 1;

        let mut chunks = fragment::chunks(payload, self.padding).peekable();
        while let Some(chunk) = chunks.next() {
            let pkt = icmp::build_echo_request(self.ident, seq, &chunk);
            self.transport
                .send_to(&pkt, dst)
                .map_err(|source| DispatchError::Send { seq, source })?;

            log::debug!("echo request id={} seq={} {} bytes -> {}", self.ident, seq, chunk.len(), dst);
            self.console.say(format_args!(
                "Pacote enviado para {} com payload: {}",
                palette.addr(self.target),
                palette.data(term::printable(&chunk))
            ));

            report.sent.push(seq);
            seq = seq.wrapping_add(1);

            if chunks.peek().is_some() {
                thread::sleep(self.pacing);
                report.pauses += 1;
            }
        }

        if !self.no_response {
            let from = self.await_reply()?;
            self.console
                .say(format_args!("Resposta recebida de {}", palette.addr(from.ip())));
            report.reply_from = Some(from);
        }

        Ok(report)
    }

    /// Espera um Echo Reply com o nosso identificador.
    fn await_reply(&mut self) -> Result<SocketAddr, DispatchError> {
        self.transport
            .set_read_timeout(self.reply_timeout)
            .map_err(DispatchError::Receive)?;

        let deadline = self.reply_timeout.map(|t| (Instant::now() + t, t));
        let mut buf = [0u8; RECV_BUF_LEN];

        loop {
            if let Some((at, timeout)) = deadline {
                if Instant::now() >= at {
                    return Err(DispatchError::NoResponse(timeout));
                }
            }

            let (n, from) = match self.transport.recv_from(&mut buf) {
                Ok(r) => r,
                Err(e) if transport::is_timeout(&e) => continue,
                Err(e) => return Err(DispatchError::Receive(e)),
            };

            let msg = match icmp::strip_ipv4(&buf[..n]).and_then(icmp::parse) {
                Ok(msg) => msg,
                Err(e) => {
                    log::debug!("ignorando datagrama de {}: {e}", from.ip());
                    continue;
                }
            };

            if msg.is_echo_reply() && msg.ident == self.ident {
                return Ok(from);
            }
            log::debug!(
                "ignorando ICMP type={} id={} seq={} de {}",
                msg.icmp_type,
                msg.ident,
                msg.seq,
                from.ip()
            );
        }
    }
}
