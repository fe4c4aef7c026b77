use rand::Rng;

pub const PICKUP_CODE_LEN: usize = 6;

const PICKUP_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Six uppercase alphanumerics from the thread-local rng. Not unique and not
/// a secret in any cryptographic sense.
pub fn generate_pickup_code() -> String {
    generate_pickup_code_with(&mut rand::rng())
}

pub fn generate_pickup_code_with<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PICKUP_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..PICKUP_CODE_ALPHABET.len());
            char::from(PICKUP_CODE_ALPHABET[idx])
        })
        .collect()
}

pub fn codes_match(entered: &str, expected: &str) -> bool {
    entered.eq_ignore_ascii_case(expected)
}
