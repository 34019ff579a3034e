//! Codec de mensagens ICMPv4 Echo (RFC 792) e checksum da Internet (RFC 1071).

use crate::error::PacketError;

/// Tamanho do cabeçalho ICMP: type, code, checksum, identifier, sequence.
pub const ICMP_HEADER_LEN: usize = 8;

/// Cabeçalho IPv4 sem opções.
pub const IPV4_MIN_HEADER_LEN: usize = 20;

pub const ECHO_REPLY: u8 = 0;
pub const ECHO_REQUEST: u8 = 8;

/// Uma mensagem ICMP já decodificada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcmpMessage {
    pub icmp_type: u8,
    pub code: u8,
    /// Checksum como recebido (ordem de rede já convertida).
    pub checksum: u16,
    pub ident: u16,
    pub seq: u16,
    pub payload: Vec<u8>,
}

impl IcmpMessage {
    pub fn is_echo_request(&self) -> bool {
        self.icmp_type == ECHO_REQUEST
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == ECHO_REPLY
    }

    /// Echo Reply (type=0) com o mesmo identifier, sequence e payload.
    pub fn to_reply(&self) -> Vec<u8> {
        serialize(ECHO_REPLY, 0, self.ident, self.seq, &self.payload)
    }
}

/// Checksum da Internet.
///
/// Soma palavras de 16 bits little-endian (`data[i] | data[i+1] << 8`),
/// dobrando o carry a cada adição. Comprimento ímpar recebe um byte zero
/// apenas para a conta. O resultado é o complemento de um da soma.
pub fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);

    for w in &mut words {
        sum += u16::from_le_bytes([w[0], w[1]]) as u32;
        sum = fold(sum);
    }
    if let [last] = words.remainder() {
        sum += *last as u32;
        sum = fold(sum);
    }

    !(sum as u16)
}

fn fold(mut sum: u32) -> u32 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum
}

/// Monta header||payload com o checksum preenchido.
pub fn serialize(icmp_type: u8, code: u8, ident: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    let mut pkt = Vec::with_capacity(ICMP_HEADER_LEN + payload.len());

    // Checksum zerado durante o cálculo
    pkt.extend_from_slice(&[icmp_type, code, 0, 0]);
    pkt.extend_from_slice(&ident.to_be_bytes());
    pkt.extend_from_slice(&seq.to_be_bytes());
    pkt.extend_from_slice(payload);

    // A soma foi feita em palavras little-endian: htons antes de gravar
    let csum = checksum(&pkt).swap_bytes();
    pkt[2..4].copy_from_slice(&csum.to_be_bytes());

    pkt
}

/// Monta um Echo Request (type=8, code=0).
pub fn build_echo_request(ident: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    serialize(ECHO_REQUEST, 0, ident, seq, payload)
}

/// Decodifica uma mensagem ICMP (sem o cabeçalho IP).
pub fn parse(bytes: &[u8]) -> Result<IcmpMessage, PacketError> {
    if bytes.len() < ICMP_HEADER_LEN {
        return Err(PacketError::Malformed {
            len: bytes.len(),
            needed: ICMP_HEADER_LEN,
        });
    }

    Ok(IcmpMessage {
        icmp_type: bytes[0],
        code: bytes[1],
        checksum: u16::from_be_bytes([bytes[2], bytes[3]]),
        ident: u16::from_be_bytes([bytes[4], bytes[5]]),
        seq: u16::from_be_bytes([bytes[6], bytes[7]]),
        payload: bytes[ICMP_HEADER_LEN..].to_vec(),
    })
}

/// `true` quando o checksum embutido confere com header+payload.
pub fn verify(bytes: &[u8]) -> bool {
    checksum(bytes) == 0
}

/// Pula o cabeçalho IPv4 de um datagrama vindo do socket RAW.
///
/// Usa o IHL em vez de assumir 20 bytes, então pacotes com opções IP
/// também são aceitos.
pub fn strip_ipv4(datagram: &[u8]) -> Result<&[u8], PacketError> {
    let Some(&first) = datagram.first() else {
        return Err(PacketError::Malformed {
            len: 0,
            needed: IPV4_MIN_HEADER_LEN + ICMP_HEADER_LEN,
        });
    };

    let version = first >> 4;
    if version != 4 {
        return Err(PacketError::NotIpv4(version));
    }

    let ihl = first & 0x0F;
    if (ihl as usize) * 4 < IPV4_MIN_HEADER_LEN {
        return Err(PacketError::BadHeaderLength(ihl));
    }

    let start = ihl as usize * 4;
    if datagram.len() < start + ICMP_HEADER_LEN {
        return Err(PacketError::Malformed {
            len: datagram.len(),
            needed: start + ICMP_HEADER_LEN,
        });
    }

    Ok(&datagram[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_frame(icmp: &[u8]) -> Vec<u8> {
        let mut d = vec![0x45, 0, 0, 0, 0, 0, 0, 0, 64, 1, 0, 0, 10, 0, 0, 5, 10, 0, 0, 1];
        d.extend_from_slice(icmp);
        d
    }

    #[test]
    fn test_checksum_zeros() {
        assert_eq!(checksum(&[0u8; 20]), 0xFFFF);
    }

    #[test]
    fn test_checksum_ones() {
        assert_eq!(checksum(&[0xFFu8; 20]), 0);
    }

    #[test]
    fn test_checksum_little_endian_words() {
        // 0x0201 + 0x0003 = 0x0204
        assert_eq!(checksum(&[0x01, 0x02, 0x03]), !0x0204);
    }

    #[test]
    fn test_checksum_folds_carry() {
        // 0xFFFF + 0x0001 = 0x10000 -> 0x0001
        assert_eq!(checksum(&[0xFF, 0xFF, 0x01, 0x00]), !0x0001);
    }

    #[test]
    fn test_wire_checksum_matches_rfc1071() {
        // Palavras big-endian: 0x0800 + 0x1234 + 0x0001 = 0x1A35 -> 0xE5CA
        let pkt = build_echo_request(0x1234, 1, &[]);
        assert_eq!(&pkt[2..4], &[0xE5, 0xCA]);
    }

    #[test]
    fn test_serialize_layout() {
        let pkt = build_echo_request(1234, 5, b"ping");
        assert_eq!(pkt.len(), ICMP_HEADER_LEN + 4);
        assert_eq!(pkt[0], ECHO_REQUEST);
        assert_eq!(pkt[1], 0);
        assert_eq!(&pkt[4..6], &1234u16.to_be_bytes());
        assert_eq!(&pkt[6..8], &5u16.to_be_bytes());
        assert_eq!(&pkt[8..], b"ping");
    }

    #[test]
    fn test_serialized_packets_verify() {
        for len in 0..70 {
            let payload: Vec<u8> = (0..len).map(|i| (i * 37 + 11) as u8).collect();
            let pkt = serialize(ECHO_REQUEST, 0, 0xBEEF, len as u16, &payload);
            assert!(verify(&pkt), "len={len}");
        }
    }

    #[test]
    fn test_corruption_fails_verification() {
        let mut pkt = build_echo_request(7, 9, b"hello world");
        pkt[10] ^= 0x01;
        assert!(!verify(&pkt));
    }

    #[test]
    fn test_parse_round_trip() {
        let payload = [0u8, 1, 2, 0xFE, 0xFF];
        let pkt = serialize(ECHO_REPLY, 0, 0xABCD, 0x8001, &payload);
        let msg = parse(&pkt).unwrap();
        assert_eq!(msg.icmp_type, ECHO_REPLY);
        assert_eq!(msg.code, 0);
        assert_eq!(msg.ident, 0xABCD);
        assert_eq!(msg.seq, 0x8001);
        assert_eq!(msg.payload, payload);
        assert_eq!(msg.checksum.to_be_bytes(), [pkt[2], pkt[3]]);
    }

    #[test]
    fn test_parse_too_short() {
        let err = parse(&[8, 0, 0, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, PacketError::Malformed { len: 7, needed: 8 }));
    }

    #[test]
    fn test_reply_keeps_ident_seq_payload() {
        let req = parse(&build_echo_request(1234, 5, b"ping")).unwrap();
        let reply = req.to_reply();
        let msg = parse(&reply).unwrap();
        assert!(msg.is_echo_reply());
        assert_eq!((msg.ident, msg.seq), (1234, 5));
        assert_eq!(msg.payload, b"ping");
        assert!(verify(&reply));
    }

    #[test]
    fn test_strip_ipv4_plain_header() {
        let icmp = build_echo_request(1, 1, b"abc");
        let d = ipv4_frame(&icmp);
        assert_eq!(strip_ipv4(&d).unwrap(), &icmp[..]);
    }

    #[test]
    fn test_strip_ipv4_with_options() {
        let icmp = build_echo_request(1, 1, b"abc");
        let mut d = vec![0x46, 0, 0, 0, 0, 0, 0, 0, 64, 1, 0, 0, 10, 0, 0, 5, 10, 0, 0, 1];
        d.extend_from_slice(&[1, 1, 1, 0]);
        d.extend_from_slice(&icmp);
        assert_eq!(strip_ipv4(&d).unwrap(), &icmp[..]);
    }

    #[test]
    fn test_strip_ipv4_short_datagram() {
        let d = ipv4_frame(&[8, 0, 0]);
        assert!(matches!(
            strip_ipv4(&d),
            Err(PacketError::Malformed { len: 23, needed: 28 })
        ));
        assert!(strip_ipv4(&[]).is_err());
    }

    #[test]
    fn test_strip_ipv4_rejects_bad_version_and_ihl() {
        let mut d = ipv4_frame(&build_echo_request(1, 1, b""));
        d[0] = 0x65;
        assert!(matches!(strip_ipv4(&d), Err(PacketError::NotIpv4(6))));
        d[0] = 0x44;
        assert!(matches!(strip_ipv4(&d), Err(PacketError::BadHeaderLength(4))));
    }
}
