//! Generazione dei token di invito

use rand::RngCore;

/// Sorgente dei token: un trait così i test possono iniettare token fissi
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 256 bit da CSPRNG, resi come 64 caratteri esadecimali minuscoli
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomTokenGenerator;

impl TokenGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}
