//! Random password generation.

use crate::constants;
use rand::{rngs::OsRng, seq::SliceRandom, Rng};
use zeroize::Zeroizing;

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";

/// Lowercase letters are always drawn on; the other classes are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordOptions {
    pub length: usize,
    pub uppercase: bool,
    pub numbers: bool,
    pub symbols: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            length: constants::DEFAULT_PASSWORD_LENGTH,
            uppercase: true,
            numbers: true,
            symbols: false,
        }
    }
}

impl PasswordOptions {
    fn classes(&self) -> Vec<&'static [u8]> {
        let mut classes = vec![LOWERCASE.as_bytes()];
        if self.uppercase {
            classes.push(UPPERCASE.as_bytes());
        }
        if self.numbers {
            classes.push(DIGITS.as_bytes());
        }
        if self.symbols {
            classes.push(constants::PASSWORD_SYMBOLS.as_bytes());
        }
        classes
    }
}

/// Draw a password from the OS RNG. Each enabled class contributes at least
/// one character when `length` leaves room for it.
pub fn generate(options: &PasswordOptions) -> Zeroizing<String> {
    let classes = options.classes();
    let pool: Vec<u8> = classes.concat();
    let mut rng = OsRng;

    let mut chars: Vec<u8> = classes
        .iter()
        .take(options.length)
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();
    while chars.len() < options.length {
        chars.push(pool[rng.gen_range(0..pool.len())]);
    }
    chars.shuffle(&mut rng);

    Zeroizing::new(chars.into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_any(s: &str, set: &str) -> bool {
        s.chars().any(|c| set.contains(c))
    }

    #[test]
    fn test_default_length() {
        let pw = generate(&PasswordOptions::default());
        assert_eq!(pw.len(), 8);
    }

    #[test]
    fn test_every_enabled_class_present() {
        let options = PasswordOptions {
            length: 12,
            uppercase: true,
            numbers: true,
            symbols: true,
        };
        for _ in 0..50 {
            let pw = generate(&options);
            assert!(has_any(&pw, LOWERCASE));
            assert!(has_any(&pw, UPPERCASE));
            assert!(has_any(&pw, DIGITS));
            assert!(has_any(&pw, constants::PASSWORD_SYMBOLS));
        }
    }

    #[test]
    fn test_lowercase_only() {
        let options = PasswordOptions {
            length: 20,
            uppercase: false,
            numbers: false,
            symbols: false,
        };
        let pw = generate(&options);
        assert!(pw.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_short_and_zero_length() {
        let options = PasswordOptions {
            length: 2,
            symbols: true,
            ..Default::default()
        };
        assert_eq!(generate(&options).len(), 2);
        let options = PasswordOptions {
            length: 0,
            ..Default::default()
        };
        assert!(generate(&options).is_empty());
    }

    #[test]
    fn test_outputs_differ() {
        let options = PasswordOptions {
            length: 32,
            ..Default::default()
        };
        assert_ne!(*generate(&options), *generate(&options));
    }
}
