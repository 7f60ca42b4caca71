//! OpenPGP keyrings and wrapped session keys
//!
//! Secret keyrings are read into certificates to learn which secret keys
//! they hold; wrapped layer keys are PKESK packets naming the key they were
//! encrypted for. Armored and binary input are both accepted.

use std::fmt;

use sequoia_openpgp as openpgp;
use openpgp::{
    cert::{Cert, CertParser},
    parse::Parse,
    KeyID, Packet, PacketPile,
};

use crate::error::{CryptError, CryptResult};

fn openpgp_error(context: &str, err: impl fmt::Display) -> CryptError {
    CryptError::Gpg(format!("{}: {}", context, err))
}

/// The 64 bit form gpg uses on the command line
pub fn key_id_value(key_id: &KeyID) -> CryptResult<u64> {
    key_id
        .as_u64()
        .map_err(|e| openpgp_error("unsupported key ID", e))
}

/// Key IDs addressed by the PKESK packets in `data`
///
/// Other packets are skipped. The wildcard recipient is reported as `0`.
pub fn pkesk_key_ids(data: &[u8]) -> CryptResult<Vec<u64>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let pile = PacketPile::from_bytes(data)
        .map_err(|e| openpgp_error("could not parse pgp packets", e))?;

    pile.children()
        .filter_map(|packet| match packet {
            Packet::PKESK(pkesk) => Some(pkesk.recipient()),
            _ => None,
        })
        .map(key_id_value)
        .collect()
}

/// All certificates of a keyring; any malformed one is an error
pub fn read_keyring(data: &[u8]) -> CryptResult<Vec<Cert>> {
    CertParser::from_bytes(data)
        .map_err(|e| openpgp_error("could not read keyring", e))?
        .map(|cert| cert.map_err(|e| openpgp_error("malformed certificate in keyring", e)))
        .collect()
}

/// Key IDs of every secret primary key and subkey in `certs`
pub fn cert_secret_key_ids(certs: &[Cert]) -> CryptResult<Vec<u64>> {
    certs
        .iter()
        .flat_map(|cert| cert.keys().secret())
        .map(|ka| key_id_value(&ka.key().keyid()))
        .collect()
}

/// Key IDs of every secret primary key and subkey in a keyring
pub fn secret_key_ids(data: &[u8]) -> CryptResult<Vec<u64>> {
    cert_secret_key_ids(&read_keyring(data)?)
}

/// True if `data` is a well-formed keyring holding at least one secret key
pub fn is_secret_keyring(data: &[u8]) -> bool {
    match read_keyring(data) {
        Ok(certs) => certs.iter().any(Cert::is_tsk),
        Err(_) => false,
    }
}
