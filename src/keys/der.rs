//! DER structures of PKIX keys and certificates
//!
//! Each check decodes the whole buffer as one ASN.1 type; trailing data is
//! a failure. Signatures and key parameters are not verified.
//!
//! SubjectPublicKeyInfo  ::=  SEQUENCE  {
//!   algorithm         AlgorithmIdentifier,
//!   subjectPublicKey  BIT STRING
//! }

use der::Decode;
use pkcs1::RsaPrivateKey;
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use sec1::EcPrivateKey;
use spki::SubjectPublicKeyInfoRef;
use x509_cert::Certificate;

fn decodes<'a, T: Decode<'a>>(der: &'a [u8]) -> bool {
    T::from_der(der).is_ok()
}

/// SubjectPublicKeyInfo (PKIX public key)
pub(crate) fn is_subject_public_key_info(der: &[u8]) -> bool {
    decodes::<SubjectPublicKeyInfoRef<'_>>(der)
}

/// X.509 Certificate
pub(crate) fn is_certificate(der: &[u8]) -> bool {
    decodes::<Certificate>(der)
}

/// PKCS8 PrivateKeyInfo / OneAsymmetricKey
pub(crate) fn is_pkcs8_private_key(der: &[u8]) -> bool {
    decodes::<PrivateKeyInfo<'_>>(der)
}

/// PKCS1 RSAPrivateKey
pub(crate) fn is_pkcs1_private_key(der: &[u8]) -> bool {
    decodes::<RsaPrivateKey<'_>>(der)
}

/// SEC1 ECPrivateKey
pub(crate) fn is_ec_private_key(der: &[u8]) -> bool {
    decodes::<EcPrivateKey<'_>>(der)
}

/// Any unencrypted private key encoding
pub(crate) fn is_private_key(der: &[u8]) -> bool {
    is_pkcs8_private_key(der) || is_pkcs1_private_key(der) || is_ec_private_key(der)
}

/// PKCS8 EncryptedPrivateKeyInfo (PBES1 or PBES2)
pub(crate) fn is_encrypted_private_key_info(der: &[u8]) -> bool {
    decodes::<EncryptedPrivateKeyInfo<'_>>(der)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::pem;
    use crate::keys::tests::{
        certificate_der, certificate_pem, encrypted_pkcs8_pem, private_key_pem, public_key_pem,
        EC_PRIVATE_KEY_PEM, RSA_PRIVATE_KEY_PEM,
    };

    fn der_of(pem_text: &str) -> Vec<u8> {
        pem::decode(pem_text.as_bytes()).unwrap().contents
    }

    #[test]
    fn test_public_key_and_certificate() {
        let spki = der_of(&public_key_pem());
        assert!(is_subject_public_key_info(&spki));
        assert!(!is_certificate(&spki));

        let cert = certificate_der();
        assert_eq!(der_of(&certificate_pem()), cert);
        assert!(is_certificate(&cert));
        assert!(!is_subject_public_key_info(&cert));
    }

    #[test]
    fn test_private_key_encodings() {
        let pkcs8 = der_of(&private_key_pem());
        assert!(is_pkcs8_private_key(&pkcs8));
        assert!(!is_pkcs1_private_key(&pkcs8));

        let pkcs1 = der_of(RSA_PRIVATE_KEY_PEM);
        assert!(is_pkcs1_private_key(&pkcs1));
        assert!(!is_ec_private_key(&pkcs1));

        let sec1 = der_of(EC_PRIVATE_KEY_PEM);
        assert!(is_ec_private_key(&sec1));
        assert!(!is_pkcs8_private_key(&sec1));

        for der in [&pkcs8, &pkcs1, &sec1] {
            assert!(is_private_key(der));
        }
        assert!(!is_private_key(&der_of(&public_key_pem())));
    }

    #[test]
    fn test_encrypted_private_key_info() {
        let encrypted = der_of(&encrypted_pkcs8_pem());
        assert!(is_encrypted_private_key_info(&encrypted));
        assert!(!is_private_key(&encrypted));
        assert!(!is_encrypted_private_key_info(&der_of(&private_key_pem())));
    }

    #[test]
    fn test_trailing_and_truncated_data_rejected() {
        let mut spki = der_of(&public_key_pem());
        spki.push(0x00);
        assert!(!is_subject_public_key_info(&spki));

        let cert = certificate_der();
        assert!(!is_certificate(&cert[..cert.len() - 1]));
        assert!(!is_certificate(&[]));
    }
}
