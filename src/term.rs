//! Cores ANSI para a saída do console.

use std::fmt;
use std::io::IsTerminal;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Formatação sem estado global: quem cria decide se há terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn new(color: bool) -> Self {
        Palette { color }
    }

    /// Cores apenas se stdout for um terminal.
    pub fn for_stdout() -> Self {
        Palette::new(std::io::stdout().is_terminal())
    }

    /// Endereços em vermelho.
    pub fn addr<T: fmt::Display>(&self, value: T) -> Painted<T> {
        Painted { value, code: RED, color: self.color }
    }

    /// Payloads em verde.
    pub fn data<T: fmt::Display>(&self, value: T) -> Painted<T> {
        Painted { value, code: GREEN, color: self.color }
    }
}

pub struct Painted<T> {
    value: T,
    code: &'static str,
    color: bool,
}

impl<T: fmt::Display> fmt::Display for Painted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.color {
            write!(f, "{}{}{}", self.code, self.value, RESET)
        } else {
            self.value.fmt(f)
        }
    }
}

/// Texto legível de um payload, descartando bytes que não são UTF-8.
pub fn printable(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|c| c.valid()).collect()
}

/// Saída para o operador; `silent` suprime tudo.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    pub palette: Palette,
    pub silent: bool,
}

impl Console {
    pub fn new(palette: Palette, silent: bool) -> Self {
        Console { palette, silent }
    }

    pub fn say(&self, args: fmt::Arguments<'_>) {
        if !self.silent {
            println!("{args}");
        }
    }
}
