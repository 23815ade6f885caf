//! where a module's source code comes from
//!
//! A module source is one of
//! - a local path, `./modules/net` or `../shared`, relative to the calling module's own source
//! - a registry address, `[host/]namespace/name/system[//subdir]`
//! - a remote package, anything with a scheme (`https://...`, `git::...`), optionally with a
//!   `//subdir` inside the package
use super::DEFAULT_PROVIDER_REGISTRY_HOST;
use std::fmt;

/// Hosts that serve version control repositories rather than a module registry
const VCS_HOSTS: [&str; 2] = ["github.com", "bitbucket.org"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleSource {
    Local(String),
    Registry {
        host: String,
        namespace: String,
        name: String,
        target_system: String,
        /// empty for the package root
        subdir: String,
    },
    Remote {
        package: String,
        /// empty for the package root
        subdir: String,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModuleSourceError {
    #[error("invalid module source address {addr:?}: {reason}")]
    Invalid { addr: String, reason: String },
    #[error("relative path {rel} has too many \"../\" segments")]
    EscapesPackage { rel: String },
    #[error("invalid relative path from {base}: {inner}")]
    InvalidRelative {
        base: String,
        #[source]
        inner: Box<ModuleSourceError>,
    },
}

impl ModuleSource {
    pub fn is_local(&self) -> bool {
        matches!(self, ModuleSource::Local(_))
    }

    /// Like [fmt::Display], but registry addresses on the default host leave the host out
    pub fn for_display(&self) -> String {
        match self {
            ModuleSource::Registry {
                host,
                namespace,
                name,
                target_system,
                subdir,
            } if host == DEFAULT_PROVIDER_REGISTRY_HOST => {
                with_subdir(&format!("{namespace}/{name}/{target_system}"), subdir)
            }
            other => other.to_string(),
        }
    }
}

fn with_subdir(package: &str, subdir: &str) -> String {
    if subdir.is_empty() {
        return package.to_string();
    }
    // the subdirectory goes before any query string
    match package.split_once('?') {
        Some((base, query)) => format!("{base}//{subdir}?{query}"),
        None => format!("{package}//{subdir}"),
    }
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSource::Local(path) => f.write_str(path),
            ModuleSource::Registry {
                host,
                namespace,
                name,
                target_system,
                subdir,
            } => f.write_str(&with_subdir(
                &format!("{host}/{namespace}/{name}/{target_system}"),
                subdir,
            )),
            ModuleSource::Remote { package, subdir } => f.write_str(&with_subdir(package, subdir)),
        }
    }
}

fn is_local_source(src: &str) -> bool {
    src == "." || src == ".." || ["./", "../", ".\\", "..\\"]
        .iter()
        .any(|prefix| src.starts_with(prefix))
}

/// Splits `package//subdir?query` into `(package?query, subdir)`, ignoring the `//` of a scheme
fn split_subdir(src: &str) -> (String, String) {
    let search_from = src.find("://").map_or(0, |i| i + 3);
    let Some(found) = src[search_from..].find("//") else {
        return (src.to_string(), String::new());
    };
    let split_at = search_from + found;
    let (package, rest) = (&src[..split_at], &src[split_at + 2..]);
    match rest.split_once('?') {
        Some((subdir, query)) => (format!("{package}?{query}"), clean_subdir(subdir)),
        None => (package.to_string(), clean_subdir(rest)),
    }
}

fn clean_subdir(subdir: &str) -> String {
    match clean_path(subdir).as_str() {
        "." => String::new(),
        cleaned => cleaned.to_string(),
    }
}

/// Lexical path cleanup with slash separators: drops empty and `.` segments and folds `..`
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut out: Vec<&str> = vec![];
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ if rooted => {}
                _ => out.push(".."),
            },
            segment => out.push(segment),
        }
    }
    let joined = out.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

fn join_path(base: &str, rel: &str) -> String {
    match (base.is_empty(), rel.is_empty()) {
        (true, true) => String::new(),
        (true, false) => clean_path(rel),
        (false, true) => clean_path(base),
        (false, false) => clean_path(&format!("{base}/{rel}")),
    }
}

fn is_registry_name(part: &str) -> bool {
    !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_hostname(part: &str) -> bool {
    part.contains('.')
        && part
            .split(':')
            .next()
            .is_some_and(|host| host.split('.').all(is_registry_name))
}

pub fn parse_module_source(src: &str) -> Result<ModuleSource, ModuleSourceError> {
    let invalid = |reason: &str| ModuleSourceError::Invalid {
        addr: src.to_string(),
        reason: reason.to_string(),
    };

    if is_local_source(src) {
        let normalized = src.replace('\\', "/");
        let mut cleaned = clean_path(&normalized);
        if !is_local_source(&cleaned) {
            cleaned = format!("./{cleaned}");
        }
        return Ok(ModuleSource::Local(cleaned));
    }

    if src.contains("://") || src.contains("::") {
        let (package, subdir) = split_subdir(src);
        return Ok(ModuleSource::Remote { package, subdir });
    }

    let (package, subdir) = split_subdir(src);
    let parts: Vec<&str> = package.split('/').collect();
    let (host, rest) = match parts.as_slice() {
        [host, rest @ ..] if rest.len() == 3 => {
            if VCS_HOSTS.contains(host) {
                return Err(invalid(&format!(
                    "can't use {host} as a module registry host, because it's reserved for \
                     installing directly from version control repositories"
                )));
            }
            if !is_hostname(host) {
                return Err(invalid(&format!("invalid module registry hostname {host:?}")));
            }
            (host.to_string(), rest)
        }
        rest if rest.len() == 3 => (DEFAULT_PROVIDER_REGISTRY_HOST.to_string(), rest),
        _ => {
            return Err(invalid(
                "a module source address must be a local path starting with \"./\" or \"../\", \
                 a module registry address, or a remote package address with a scheme",
            ))
        }
    };

    if let Some(bad) = rest.iter().find(|part| !is_registry_name(part)) {
        return Err(invalid(&format!(
            "invalid module registry address component {bad:?}: must contain only letters, \
             digits, dashes and underscores"
        )));
    }

    Ok(ModuleSource::Registry {
        host,
        namespace: rest[0].to_string(),
        name: rest[1].to_string(),
        target_system: rest[2].to_string(),
        subdir,
    })
}

/// Resolves `rel` as seen from a module whose own source is `base`
///
/// Only a local `rel` depends on `base`. Inside a registry or remote package the result stays in
/// the same package, so a path that climbs out of it is an error.
pub fn resolve_relative_module_source(
    base: &ModuleSource,
    rel: &ModuleSource,
) -> Result<ModuleSource, ModuleSourceError> {
    let ModuleSource::Local(rel_path) = rel else {
        return Ok(rel.clone());
    };

    let join_subdir = |subdir: &str| {
        let joined = join_path(subdir, rel_path);
        if joined == ".." || joined.starts_with("../") {
            return Err(ModuleSourceError::InvalidRelative {
                base: base.to_string(),
                inner: Box::new(ModuleSourceError::EscapesPackage {
                    rel: rel_path.clone(),
                }),
            });
        }
        Ok(if joined == "." { String::new() } else { joined })
    };

    let resolved = match base {
        ModuleSource::Local(base_path) => {
            let mut joined = join_path(base_path, rel_path);
            if !is_local_source(&joined) {
                joined = format!("./{joined}");
            }
            ModuleSource::Local(joined)
        }
        ModuleSource::Registry {
            host,
            namespace,
            name,
            target_system,
            subdir,
        } => ModuleSource::Registry {
            host: host.clone(),
            namespace: namespace.clone(),
            name: name.clone(),
            target_system: target_system.clone(),
            subdir: join_subdir(subdir)?,
        },
        ModuleSource::Remote { package, subdir } => ModuleSource::Remote {
            package: package.clone(),
            subdir: join_subdir(subdir)?,
        },
    };
    tracing::trace!(%base, %rel, %resolved, "resolved relative module source");
    Ok(resolved)
}
