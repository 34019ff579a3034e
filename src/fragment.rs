//! Divisão do payload em blocos de tamanho fixo, no estilo do `ping` de cada SO.

use std::borrow::Cow;
use std::time::Duration;

/// Intervalo entre fragmentos consecutivos.
pub const PACING: Duration = Duration::from_secs(2);

/// Byte usado para completar o último bloco.
pub const PAD_BYTE: u8 = b' ';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    /// Payload inteiro num único pacote.
    #[default]
    None,
    /// Blocos de 56 bytes, como o `ping` do Linux.
    Linux,
    /// Blocos de 32 bytes, como o `ping` do Windows.
    Windows,
}

impl Padding {
    pub fn chunk_size(self) -> Option<usize> {
        match self {
            Padding::None => None,
            Padding::Linux => Some(56),
            Padding::Windows => Some(32),
        }
    }
}

/// Iterador sobre os blocos de um payload.
///
/// Com `Padding::None` produz exatamente um bloco (mesmo vazio). Com
/// padding, um payload vazio não produz nenhum bloco.
pub fn chunks(payload: &[u8], padding: Padding) -> Chunks<'_> {
    Chunks {
        rest: payload,
        size: padding.chunk_size(),
        whole_pending: padding == Padding::None,
    }
}

#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a [u8],
    size: Option<usize>,
    whole_pending: bool,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Cow<'a, [u8]>;

    fn next(&mut self) -> Option<Self::Item> {
        let Some(size) = self.size else {
            if !self.whole_pending {
                return None;
            }
            self.whole_pending = false;
            return Some(Cow::Borrowed(std::mem::take(&mut self.rest)));
        };

        if self.rest.is_empty() {
            return None;
        }

        if self.rest.len() >= size {
            let (head, tail) = self.rest.split_at(size);
            self.rest = tail;
            return Some(Cow::Borrowed(head));
        }

        let mut last = std::mem::take(&mut self.rest).to_vec();
        last.resize(size, PAD_BYTE);
        Some(Cow::Owned(last))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = match self.size {
            None => usize::from(self.whole_pending),
            Some(size) => self.rest.len().div_ceil(size),
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_padding_single_chunk() {
        let payload = vec![b'x'; 500];
        let out: Vec<_> = chunks(&payload, Padding::None).collect();
        assert_eq!(out.len(), 1);
        assert_eq!(&*out[0], &payload[..]);
    }

    #[test]
    fn test_no_padding_empty_payload_still_sends() {
        let out: Vec<_> = chunks(b"", Padding::None).collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_empty());
    }

    #[test]
    fn test_padding_empty_payload_sends_nothing() {
        assert_eq!(chunks(b"", Padding::Linux).count(), 0);
        assert_eq!(chunks(b"", Padding::Windows).len(), 0);
    }

    #[test]
    fn test_linux_split_and_pad() {
        let payload: Vec<u8> = (0..100u8).collect();
        let out: Vec<_> = chunks(&payload, Padding::Linux).collect();
        assert_eq!(out.len(), 2);
        assert_eq!(&*out[0], &payload[..56]);
        assert_eq!(&out[1][..44], &payload[56..]);
        assert!(out[1][44..].iter().all(|&b| b == PAD_BYTE));
        assert_eq!(out[1].len(), 56);
    }

    #[test]
    fn test_exact_multiple_adds_no_chunk() {
        let payload = vec![b'a'; 64];
        let out: Vec<_> = chunks(&payload, Padding::Windows).collect();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.len() == 32));
        assert!(matches!(out[1], Cow::Borrowed(_)));
    }

    #[test]
    fn test_reassembly_strips_only_final_padding() {
        for len in [1usize, 55, 56, 57, 111, 112, 113, 300] {
            let payload: Vec<u8> = (0..len).map(|i| b'a' + (i % 26) as u8).collect();
            let mut joined: Vec<u8> = chunks(&payload, Padding::Linux).flat_map(|c| c.into_owned()).collect();
            let pad = (56 - len % 56) % 56;
            assert_eq!(joined.len(), len + pad);
            joined.truncate(joined.len() - pad);
            assert_eq!(joined, payload, "len={len}");
        }
    }

    #[test]
    fn test_restartable() {
        let payload = vec![b'z'; 70];
        let it = chunks(&payload, Padding::Windows);
        let first: Vec<_> = it.clone().collect();
        let second: Vec<_> = it.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let payload = vec![0u8; 100];
        let mut it = chunks(&payload, Padding::Linux);
        assert_eq!(it.len(), 2);
        it.next();
        assert_eq!(it.len(), 1);
        it.next();
        assert_eq!(it.len(), 0);
        assert!(it.next().is_none());
    }
}
