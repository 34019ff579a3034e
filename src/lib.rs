//! Canal de mensagens sobre ICMP Echo Request/Reply.
//!
//! O cliente quebra um payload em blocos, envia cada um como Echo Request e
//! pode esperar uma resposta. O servidor escuta num socket RAW, decodifica o
//! que chega, opcionalmente responde com Echo Reply e registra o texto num
//! arquivo por IP de origem.

pub mod args;
pub mod dispatch;
pub mod error;
pub mod fragment;
pub mod icmp;
pub mod listen;
pub mod sink;
pub mod term;
pub mod transport;
