//! Socket RAW ICMP e a abstração usada por cliente e servidor.

use std::io;
use std::mem::MaybeUninit;
use std::net::SocketAddr;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::SocketError;

/// Tamanho do buffer de recepção.
pub const RECV_BUF_LEN: usize = 1024;

/// Envio e recepção de datagramas ICMP crus.
///
/// `recv_from` entrega o datagrama com o cabeçalho IPv4 no início, como o
/// kernel faz para sockets RAW IPv4.
pub trait IcmpTransport {
    fn send_to(&mut self, packet: &[u8], dst: SocketAddr) -> io::Result<usize>;

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;

    /// `None` bloqueia indefinidamente.
    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;
}

#[cfg(unix)]
const SOCK_RAW: i32 = libc::SOCK_RAW;
// libc::SOCK_RAW não existe no Windows
#[cfg(not(unix))]
const SOCK_RAW: i32 = 3;

/// Socket AF_INET / SOCK_RAW / IPPROTO_ICMP.
pub struct RawSocket {
    sock: Socket,
}

impl RawSocket {
    pub fn open() -> Result<Self, SocketError> {
        let sock = Socket::new(Domain::IPV4, Type::from(SOCK_RAW), Some(Protocol::ICMPV4))
            .map_err(classify)?;
        Ok(RawSocket { sock })
    }
}

/// Separa falta de privilégio dos demais erros de criação.
fn classify(e: io::Error) -> SocketError {
    match e.raw_os_error() {
        #[cfg(unix)]
        Some(libc::EPERM) | Some(libc::EACCES) => SocketError::Privilege(e),
        _ if e.kind() == io::ErrorKind::PermissionDenied => SocketError::Privilege(e),
        _ => SocketError::Create(e),
    }
}

/// Erros que indicam que o socket em si não serve mais.
pub fn is_fatal(e: &io::Error) -> bool {
    #[cfg(unix)]
    {
        matches!(e.raw_os_error(), Some(libc::EBADF) | Some(libc::ENOTSOCK))
    }
    #[cfg(not(unix))]
    {
        let _ = e;
        false
    }
}

/// Leitura que apenas estourou o timeout.
pub fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

impl IcmpTransport for RawSocket {
    fn send_to(&mut self, packet: &[u8], dst: SocketAddr) -> io::Result<usize> {
        self.sock.send_to(packet, &dst.into())
    }

    fn recv_from(&mut self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        // SAFETY: u8 e MaybeUninit<u8> têm o mesmo layout e recv_from nunca
        // escreve bytes não inicializados no buffer.
        let uninit = unsafe { &mut *(buf as *mut [u8] as *mut [MaybeUninit<u8>]) };
        let (n, addr) = self.sock.recv_from(uninit)?;
        let addr = addr
            .as_socket()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "endereço de origem não é IP"))?;
        Ok((n, addr))
    }

    fn set_read_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.sock.set_read_timeout(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_classify_permission_errors() {
        let e = io::Error::from_raw_os_error(libc::EPERM);
        assert!(matches!(classify(e), SocketError::Privilege(_)));
        let e = io::Error::from_raw_os_error(libc::EACCES);
        assert!(matches!(classify(e), SocketError::Privilege(_)));
        let e = io::Error::from_raw_os_error(libc::EMFILE);
        assert!(matches!(classify(e), SocketError::Create(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_fatal_socket_errors() {
        assert!(is_fatal(&io::Error::from_raw_os_error(libc::EBADF)));
        assert!(!is_fatal(&io::Error::from_raw_os_error(libc::EHOSTUNREACH)));
    }

    #[test]
    fn test_timeout_kinds() {
        assert!(is_timeout(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_timeout(&io::Error::from(io::ErrorKind::ConnectionRefused)));
    }
}
