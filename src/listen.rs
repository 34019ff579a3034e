//! Laço do servidor: recebe, decodifica, reporta, registra e responde.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::PacketError;
use crate::icmp::{self, IcmpMessage};
use crate::sink::MessageSink;
use crate::term::{self, Console};
use crate::transport::{self, IcmpTransport, RECV_BUF_LEN};

/// Resultado do tratamento de um datagrama.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handled {
    pub source: IpAddr,
    pub message: IcmpMessage,
    pub checksum_ok: bool,
    pub text: String,
    pub logged: bool,
    pub replied: bool,
}

/// Texto do payload para exibição e registro.
///
/// Bytes que não são UTF-8 são descartados; espaços e NULs nas pontas
/// são removidos (o padding do cliente some junto).
pub fn decode_text(payload: &[u8]) -> String {
    term::printable(payload)
        .trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

pub struct Listener<T, S> {
    transport: T,
    respond: bool,
    sink: Option<S>,
    console: Console,
}

impl<T: IcmpTransport, S: MessageSink> Listener<T, S> {
    pub fn new(transport: T, respond: bool, sink: Option<S>, console: Console) -> Self {
        Listener {
            transport,
            respond,
            sink,
            console,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Recebe até `running` virar `false`. Retorna quantos pacotes foram
    /// tratados.
    ///
    /// Datagramas malformados e falhas de envio são registrados e
    /// ignorados; só um socket inutilizável encerra o laço com erro.
    pub fn serve(&mut self, running: &AtomicBool, poll: Duration) -> io::Result<u64> {
        self.transport.set_read_timeout(Some(poll))?;

        let mut buf = [0u8; RECV_BUF_LEN];
        let mut handled = 0u64;

        while running.load(Ordering::SeqCst) {
            let (n, from) = match self.transport.recv_from(&mut buf) {
                Ok(r) => r,
                Err(e) if transport::is_timeout(&e) => continue,
                Err(e) if transport::is_fatal(&e) => return Err(e),
                Err(e) => {
                    log::error!("erro na leitura: {e}");
                    continue;
                }
            };

            match self.handle(&buf[..n], from) {
                Ok(_) => handled += 1,
                Err(e) => log::warn!("datagrama de {} descartado: {e}", from.ip()),
            }
        }

        Ok(handled)
    }

    /// Trata um datagrama IPv4 completo vindo de `from`.
    pub fn handle(&mut self, datagram: &[u8], from: SocketAddr) -> Result<Handled, PacketError> {
        let palette = self.console.palette;
        let source = from.ip();
        self.console
            .say(format_args!("Pacote recebido de {}", palette.addr(source)));

        let bytes = icmp::strip_ipv4(datagram)?;
        let checksum_ok = icmp::verify(bytes);
        let message = icmp::parse(bytes)?;
        if !checksum_ok {
            log::warn!(
                "checksum inválido de {source}: id={} seq={}",
                message.ident,
                message.seq
            );
        }

        self.console.say(format_args!(
            "ICMP Type: {}, Code: {}, Checksum: {}, ID: {}, Sequence: {}",
            message.icmp_type, message.code, message.checksum, message.ident, message.seq
        ));
        let text = decode_text(&message.payload);
        self.console
            .say(format_args!("Payload do cliente: {}", palette.data(&text)));

        let mut logged = false;
        if let Some(sink) = self.sink.as_mut() {
            match sink.deliver(source, &text) {
                Ok(()) => {
                    logged = true;
                    self.console
                        .say(format_args!("Mensagem de {} registrada", palette.addr(source)));
                }
                Err(e) => log::error!("falha ao registrar mensagem de {source}: {e}"),
            }
        }

        let mut replied = false;
        if self.respond && message.is_echo_request() {
            self.console.say(format_args!("Echo request recebido, enviando resposta"));
            match self.transport.send_to(&message.to_reply(), from) {
                Ok(_) => {
                    replied = true;
                    self.console
                        .say(format_args!("Echo reply enviado para {}", palette.addr(source)));
                }
                Err(e) => log::error!("falha ao responder {source}: {e}"),
            }
        }

        Ok(Handled {
            source,
            message,
            checksum_ok,
            text,
            logged,
            replied,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_trims_padding_and_nul() {
        assert_eq!(decode_text(b"secret      "), "secret");
        assert_eq!(decode_text(b"  hi\n\0"), "hi");
        assert_eq!(decode_text(b"a\xffb"), "ab");
        assert_eq!(decode_text(b""), "");
    }

    #[test]
    fn test_decode_keeps_inner_spaces() {
        assert_eq!(decode_text(b"hello world  "), "hello world");
    }
}
