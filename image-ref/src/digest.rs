use anyhow::{bail, Error, Result};
use nutype::nutype;

/// A content checksum: `algorithm ":" hex`.
#[nutype(
    validate(error = Error, with = checksum_digest),
    derive(Clone, Debug, Display, Deref, TryFrom, Eq, PartialEq, Hash))
]
pub(crate) struct Digest(String);

fn checksum_digest(digest: &str) -> Result<()> {
    let Some((algorithm, hex)) = digest.split_once(':') else {
        bail!("invalid checksum digest format: {digest:?}")
    };
    let size = match algorithm {
        "sha256" => 32,
        "sha384" => 48,
        "sha512" => 64,
        _ => bail!("unsupported digest algorithm: {algorithm:?}"),
    };
    if hex.len() != 2 * size {
        bail!("invalid checksum digest length for {algorithm}: {hex:?}")
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("invalid checksum digest format: {digest:?}")
    }
    Ok(())
}

#[test]
fn safe_digests() {
    let digest =
        Digest::try_new("sha256:bc8813ea7b3603864987522f02a76101c17ad122e1c46d790efc0fca78ca7bfb")
            .unwrap();
    assert_eq!(
        digest.to_string(),
        "sha256:bc8813ea7b3603864987522f02a76101c17ad122e1c46d790efc0fca78ca7bfb"
    );

    assert!(Digest::try_new(format!("sha384:{}", "0f".repeat(48))).is_ok());
    assert!(Digest::try_new(format!("sha512:{}", "0F".repeat(64))).is_ok());
}

#[test]
fn unsafe_digests() {
    assert!(Digest::try_new("").is_err());
    assert!(Digest::try_new("sha256").is_err()); // No hex at all
    assert!(Digest::try_new("sha256:").is_err());
    assert!(Digest::try_new("sha256:short").is_err());
    assert!(Digest::try_new(format!("sha256:{}", "zz".repeat(32))).is_err());
    assert!(Digest::try_new(format!("sha384:{}", "ab".repeat(32))).is_err()); // sha256-sized hex
    assert!(Digest::try_new(format!("md5:{}", "ab".repeat(32))).is_err());
}
