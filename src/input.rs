use std::io;

use crate::term::{RawModeGuard, TerminalBackend};

pub const ESC: u8 = 0x1b;

/// Longest parameter run accepted inside an escape sequence
const MAX_SEQUENCE_PARAMS: usize = 16;

/// A decoded keystroke
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A plain byte, e.g. `b'q'`
    Byte(u8),
    /// An `ESC [` or `ESC O` sequence such as an arrow key (`ESC [ A`)
    Sequence { params: Vec<u8>, final_byte: u8 },
    /// Input was closed
    Eof,
}

/// Block for one keystroke.
///
/// Raw mode is held only for the duration of this read and released before
/// returning, whatever the outcome.
pub fn read_key<T: TerminalBackend + ?Sized>(term: &mut T) -> io::Result<Key> {
    let mut raw = RawModeGuard::acquire(term)?;
    decode(|| raw.read_byte())
}

/// Decode one key from a byte stream
pub fn decode<F>(mut next: F) -> io::Result<Key>
where
    F: FnMut() -> io::Result<Option<u8>>,
{
    let first = match next()? {
        Some(b) => b,
        None => return Ok(Key::Eof),
    };
    if first != ESC {
        return Ok(Key::Byte(first));
    }

    match next()? {
        Some(b'[') | Some(b'O') => {}
        // Meta-prefixed key: keep the key, drop the prefix
        Some(other) => return Ok(Key::Byte(other)),
        None => return Ok(Key::Byte(ESC)),
    }

    let mut params = Vec::new();
    loop {
        let b = match next()? {
            Some(b) => b,
            None => return Ok(Key::Eof),
        };
        if (0x40..=0x7e).contains(&b) || params.len() >= MAX_SEQUENCE_PARAMS {
            return Ok(Key::Sequence { params, final_byte: b });
        }
        params.push(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::testing::ScriptedTerminal;

    fn decode_bytes(bytes: &[u8]) -> Key {
        let mut it = bytes.iter().copied();
        decode(|| Ok(it.next())).unwrap()
    }

    #[test]
    fn test_plain_bytes() {
        assert_eq!(decode_bytes(b"q"), Key::Byte(b'q'));
        assert_eq!(decode_bytes(b"A"), Key::Byte(b'A'));
        assert_eq!(decode_bytes(b""), Key::Eof);
    }

    #[test]
    fn test_arrow_sequences() {
        assert_eq!(
            decode_bytes(b"\x1b[A"),
            Key::Sequence { params: vec![], final_byte: b'A' }
        );
        assert_eq!(
            decode_bytes(b"\x1bOD"),
            Key::Sequence { params: vec![], final_byte: b'D' }
        );
        // Modified arrows keep only the final byte meaningful
        assert_eq!(
            decode_bytes(b"\x1b[1;5B"),
            Key::Sequence { params: b"1;5".to_vec(), final_byte: b'B' }
        );
    }

    #[test]
    fn test_tilde_sequences() {
        assert_eq!(
            decode_bytes(b"\x1b[6~"),
            Key::Sequence { params: b"6".to_vec(), final_byte: b'~' }
        );
    }

    #[test]
    fn test_meta_prefix_and_truncated_sequences() {
        assert_eq!(decode_bytes(b"\x1bq"), Key::Byte(b'q'));
        assert_eq!(decode_bytes(b"\x1b"), Key::Byte(ESC));
        assert_eq!(decode_bytes(b"\x1b[12"), Key::Eof);
    }

    #[test]
    fn test_read_key_pairs_raw_mode_per_key() {
        let mut term = ScriptedTerminal::new(80, 24).with_input(b"\x1b[Bq");

        assert_eq!(
            read_key(&mut term).unwrap(),
            Key::Sequence { params: vec![], final_byte: b'B' }
        );
        assert!(!term.raw);
        assert_eq!(read_key(&mut term).unwrap(), Key::Byte(b'q'));
        assert_eq!(read_key(&mut term).unwrap(), Key::Eof);

        assert_eq!(term.raw_entries, 3);
        assert_eq!(term.raw_exits, 3);
    }

    #[test]
    fn test_read_key_restores_mode_on_failure() {
        let mut term = ScriptedTerminal::new(80, 24);
        term.fail_reads = true;

        assert!(read_key(&mut term).is_err());
        assert!(!term.raw);
        assert_eq!(term.raw_exits, 1);
    }
}
