use anyhow::{bail, Result};

use crate::{digest::Digest, regexp};

pub(crate) const DEFAULT_HOSTNAME: &str = "docker.io";
pub(crate) const LEGACY_DEFAULT_HOSTNAME: &str = "index.docker.io";
pub(crate) const DEFAULT_REPO_PREFIX: &str = "library/";
pub(crate) const DEFAULT_TAG: &str = "latest";

const NAME_TOTAL_LENGTH_MAX: usize = 255;

/// A valid repository name plus whichever of tag or digest qualifies it.
///
/// `name` is kept normalized: the default hostname and its `library/` prefix are
/// elided, the legacy default hostname is rewritten. Hostname-dependent views
/// recompute the split on demand.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) struct Named {
    name: String,
    suffix: Option<Suffix>,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Suffix {
    Tag(String),
    Digest(Digest),
}

/// Validates and tokenizes a remote identifier (no scheme) into a [`Named`].
pub(crate) fn parse(s: &str) -> Result<Named> {
    let Some(groups) = regexp::REFERENCE.captures(s) else {
        if s.is_empty() {
            bail!("repository name must have at least one component")
        }
        if regexp::REFERENCE.is_match(&s.to_lowercase()) {
            bail!("repository name must be lowercase")
        }
        bail!("invalid reference format")
    };

    let name = groups.get(1).map_or("", |x| x.as_str());
    if name.len() > NAME_TOTAL_LENGTH_MAX {
        bail!("repository name must not be more than {NAME_TOTAL_LENGTH_MAX} characters")
    }
    let name = with_name(name)?;

    // A digest pins contents: it wins over any tag also given.
    let suffix = match (groups.get(3), groups.get(2)) {
        (Some(digest), _) => Some(Suffix::Digest(digest.as_str().try_into()?)),
        (None, Some(tag)) => Some(Suffix::Tag(tag.as_str().to_owned())),
        (None, None) => None,
    };

    Ok(Named { name, suffix })
}

impl Named {
    /// Repository path without the registry. (ie: library/debian)
    #[must_use]
    pub(crate) fn remote_name(&self) -> String {
        split_hostname(&self.name).1
    }

    /// Registry host, port included when explicit. (ie: localhost:5000)
    #[must_use]
    pub(crate) fn hostname(&self) -> String {
        split_hostname(&self.name).0
    }

    /// Registry-qualified repository path. (ie: docker.io/library/debian)
    #[must_use]
    pub(crate) fn full_name(&self) -> String {
        let (hostname, remote_name) = split_hostname(&self.name);
        format!("{hostname}/{remote_name}")
    }

    #[must_use]
    pub(crate) fn suffix(&self) -> Option<&Suffix> {
        self.suffix.as_ref()
    }

    /// Qualifies a bare repository name with the implicit `latest` tag.
    #[must_use]
    pub(crate) fn with_default_tag(mut self) -> Self {
        if self.suffix.is_none() {
            self.suffix = Some(Suffix::Tag(DEFAULT_TAG.to_owned()));
        }
        self
    }
}

/// Validates `name` down to its normalized form.
fn with_name(name: &str) -> Result<String> {
    let name = normalize(name)?;
    if regexp::HEX_ID.is_match(&name) {
        bail!("invalid repository name ({name}), cannot specify 64-byte hexadecimal strings")
    }
    if !regexp::NAME.is_match(&name) {
        bail!("invalid reference format")
    }
    Ok(name)
}

/// Elides the default hostname and repo prefix. Explicit registries stay as given.
fn normalize(name: &str) -> Result<String> {
    let (hostname, remote_name) = split_hostname(name);
    if remote_name.to_lowercase() != remote_name {
        bail!("invalid reference format: repository name must be lowercase")
    }
    if hostname == DEFAULT_HOSTNAME {
        let short = remote_name.strip_prefix(DEFAULT_REPO_PREFIX).unwrap_or(&remote_name);
        return Ok(short.to_owned());
    }
    Ok(name.to_owned())
}

/// Splits a repository name into hostname and remote name.
///
/// The first `/`-separated component is a registry only when it can be one:
/// a dot, a port, or `localhost`. Anything else is part of the path, served
/// by the default registry.
#[must_use]
fn split_hostname(name: &str) -> (String, String) {
    let (mut hostname, mut remote_name) = match name.split_once('/') {
        Some((host, path)) if host.contains(['.', ':']) || host == "localhost" => {
            (host.to_owned(), path.to_owned())
        }
        _ => (DEFAULT_HOSTNAME.to_owned(), name.to_owned()),
    };
    if hostname == LEGACY_DEFAULT_HOSTNAME {
        DEFAULT_HOSTNAME.clone_into(&mut hostname);
    }
    if hostname == DEFAULT_HOSTNAME && !remote_name.contains('/') {
        remote_name = format!("{DEFAULT_REPO_PREFIX}{remote_name}");
    }
    (hostname, remote_name)
}

#[test]
fn hostname_splitting() {
    for (name, hostname, remote_name) in [
        ("foo/bar", DEFAULT_HOSTNAME, "foo/bar"),
        ("debian", DEFAULT_HOSTNAME, "library/debian"),
        ("docker.io/debian", DEFAULT_HOSTNAME, "library/debian"),
        ("index.docker.io/foo/bar", DEFAULT_HOSTNAME, "foo/bar"),
        ("localhost/foo/bar", "localhost", "foo/bar"),
        ("localhost.localdomain:5000/foo/bar", "localhost.localdomain:5000", "foo/bar"),
        ("quay.io/foo/bar/baz", "quay.io", "foo/bar/baz"),
    ] {
        assert_eq!(split_hostname(name), (hostname.to_owned(), remote_name.to_owned()));
    }
}

#[test]
fn normalized_names() {
    for (name, normalized) in [
        ("debian", "debian"),
        ("library/debian", "debian"),
        ("docker.io/library/debian", "debian"),
        ("index.docker.io/debian", "debian"),
        ("localhost:5000/library/debian", "localhost:5000/library/debian"),
        ("quay.io/coreos/etcd", "quay.io/coreos/etcd"),
    ] {
        assert_eq!(with_name(name).unwrap(), normalized);
    }
}

#[test]
fn default_tagging() {
    let named = parse("foo/bar").unwrap();
    assert_eq!(named.suffix(), None);
    let named = named.with_default_tag();
    assert_eq!(named.suffix(), Some(&Suffix::Tag(DEFAULT_TAG.to_owned())));

    let named = parse("foo/bar:1.1").unwrap().with_default_tag();
    assert_eq!(named.suffix(), Some(&Suffix::Tag("1.1".to_owned())));
}

#[test]
fn rejects_image_ids_as_names() {
    let id = "a3ed95caeb02ffe68cdd9fd84406680ae93d633cb16422d00e8a7c22955b46d4";
    assert!(parse(id).is_err());
    // Same hex, pinned: now it's a content address.
    assert!(parse(&format!("debian@sha256:{id}")).is_ok());
}

#[test]
fn rejects_uppercase_names() {
    let err = parse("foo/BAR").unwrap_err();
    assert!(err.to_string().contains("lowercase"), "{err}");
}

#[test]
fn rejects_overlong_names() {
    let okay = "a/".repeat(127) + "a"; // 255 chars
    assert!(parse(&okay).is_ok());
    let err = parse(&format!("a/{okay}")).unwrap_err();
    assert!(err.to_string().contains("more than 255"), "{err}");
}

#[test]
fn rejects_empty_names() {
    let err = parse("").unwrap_err();
    assert!(err.to_string().contains("at least one component"), "{err}");
}
