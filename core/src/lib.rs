//! Core types for the Podman Desktop extensions catalog.
//!
//! This crate provides the data types shared by the catalog client, the
//! local catalog mirror, and anything else that reads the catalog document.
//!
//! # Overview
//!
//! The catalog comes in two shapes:
//!
//! - [`CatalogDocument`] / [`PublishedExtension`] - the wire format served
//!   by the remote catalog (`{ "extensions": [...] }`, camelCase fields)
//! - [`CatalogExtension`] - the internal shape consumed by the application,
//!   with a composed id, a defaulted `unlisted` flag and parsed timestamps
//!
//! [`FetchableExtension`] is the `(id, OCI reference)` projection used to
//! trigger an OCI-based install.
//!
//! # Example
//!
//! ```
//! use catalog_core::{CatalogDocument, CatalogExtension};
//!
//! let body = r#"{
//!   "extensions": [{
//!     "publisher": { "publisherName": "foo", "displayName": "Foo" },
//!     "extensionName": "fooName",
//!     "displayName": "Foo extension",
//!     "shortDescription": "does foo",
//!     "license": "Apache-2.0",
//!     "categories": [],
//!     "versions": [{
//!       "version": "1.0.0",
//!       "preview": false,
//!       "lastUpdated": "2024-01-02T03:04:05Z",
//!       "ociUri": "oci-registry.foo/foo/bar",
//!       "files": []
//!     }]
//!   }]
//! }"#;
//!
//! let doc: CatalogDocument = serde_json::from_str(body).unwrap();
//! let ext = CatalogExtension::try_from(doc.extensions[0].clone()).unwrap();
//!
//! assert_eq!(ext.id, "foo.fooName");
//! assert!(!ext.unlisted);
//! ```

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Errors raised while mapping a published extension into its catalog shape.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    #[error("Invalid lastUpdated {value:?} for {id}@{version}: {source}")]
    InvalidTimestamp {
        id: String,
        version: String,
        value: String,
        #[source]
        source: jiff::Error,
    },
}

/// The catalog document served by the remote endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// All published extensions, listed or not.
    #[serde(default)]
    pub extensions: Vec<PublishedExtension>,
}

impl CatalogDocument {
    /// Finds a published extension by its composed id (`publisher.extension`).
    pub fn find(&self, id: &str) -> Option<&PublishedExtension> {
        self.extensions.iter().find(|e| e.id() == id)
    }
}

/// Publisher of an extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publisher {
    /// Machine name, first half of the extension id.
    pub publisher_name: String,
    /// Human-readable publisher name.
    pub display_name: String,
}

/// An extension as published in the remote catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedExtension {
    pub publisher: Publisher,
    /// Machine name, second half of the extension id.
    pub extension_name: String,
    pub display_name: String,
    pub short_description: String,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Hidden from default listings when `true`. Often omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlisted: Option<bool>,
    #[serde(default)]
    pub versions: Vec<PublishedVersion>,
}

impl PublishedExtension {
    /// The composed id, `publisherName.extensionName`.
    ///
    /// Neither half is escaped, so an embedded dot makes the id ambiguous.
    pub fn id(&self) -> String {
        format!("{}.{}", self.publisher.publisher_name, self.extension_name)
    }
}

/// A single published version of an extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedVersion {
    pub version: String,
    #[serde(default)]
    pub preview: bool,
    /// ISO 8601 timestamp, kept as a string on the wire.
    pub last_updated: String,
    /// OCI image reference holding the packaged extension.
    pub oci_uri: String,
    #[serde(default)]
    pub files: Vec<ExtensionFile>,
    /// Semver requirement on the host application version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub podman_desktop_version: Option<String>,
}

/// An asset attached to a version (icon, README, LICENSE, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionFile {
    pub asset_type: String,
    pub data: String,
}

/// An extension as consumed by the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogExtension {
    /// `publisher_name.extension_name`.
    pub id: String,
    pub publisher_name: String,
    pub publisher_display_name: String,
    pub extension_name: String,
    pub display_name: String,
    pub short_description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Always a plain bool; absent on the wire means `false`.
    #[serde(default)]
    pub unlisted: bool,
    #[serde(default)]
    pub versions: Vec<CatalogVersion>,
}

/// A version of a [`CatalogExtension`], with its timestamp parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogVersion {
    pub version: String,
    pub preview: bool,
    pub files: Vec<ExtensionFile>,
    pub oci_uri: String,
    pub last_updated: Timestamp,
    #[serde(default)]
    pub podman_desktop_version: Option<String>,
}

impl CatalogVersion {
    /// Checks this version's host requirement against `host`.
    ///
    /// A missing requirement, or one that is not a valid semver requirement,
    /// places no constraint on the host.
    pub fn is_compatible_with(&self, host: &semver::Version) -> bool {
        match self.podman_desktop_version.as_deref() {
            None => true,
            Some(raw) => match semver::VersionReq::parse(raw) {
                Ok(req) => req.matches(host),
                Err(_) => true,
            },
        }
    }
}

impl CatalogExtension {
    /// The most recently updated version.
    ///
    /// Ties keep catalog order, so the first of equally recent versions wins.
    pub fn latest_version(&self) -> Option<&CatalogVersion> {
        newest(self.versions.iter())
    }

    /// The most recently updated version that accepts the given host version.
    pub fn latest_compatible_version(&self, host: &semver::Version) -> Option<&CatalogVersion> {
        newest(self.versions.iter().filter(|v| v.is_compatible_with(host)))
    }

    /// Projects this extension to an installable `(id, link)` pair.
    ///
    /// Returns `None` for extensions without any version.
    pub fn to_fetchable(&self) -> Option<FetchableExtension> {
        self.latest_version().map(|v| FetchableExtension {
            extension_id: self.id.clone(),
            link: v.oci_uri.clone(),
        })
    }
}

fn newest<'a>(versions: impl Iterator<Item = &'a CatalogVersion>) -> Option<&'a CatalogVersion> {
    versions.fold(None, |best: Option<&CatalogVersion>, v| match best {
        Some(b) if b.last_updated >= v.last_updated => Some(b),
        _ => Some(v),
    })
}

impl TryFrom<PublishedExtension> for CatalogExtension {
    type Error = MappingError;

    fn try_from(published: PublishedExtension) -> Result<Self, Self::Error> {
        let id = published.id();

        let versions = published
            .versions
            .into_iter()
            .map(|v| {
                let last_updated = v.last_updated.parse::<Timestamp>().map_err(|source| {
                    MappingError::InvalidTimestamp {
                        id: id.clone(),
                        version: v.version.clone(),
                        value: v.last_updated.clone(),
                        source,
                    }
                })?;
                Ok(CatalogVersion {
                    version: v.version,
                    preview: v.preview,
                    files: v.files,
                    oci_uri: v.oci_uri,
                    last_updated,
                    podman_desktop_version: v.podman_desktop_version,
                })
            })
            .collect::<Result<Vec<_>, MappingError>>()?;

        Ok(CatalogExtension {
            id,
            publisher_name: published.publisher.publisher_name,
            publisher_display_name: published.publisher.display_name,
            extension_name: published.extension_name,
            display_name: published.display_name,
            short_description: published.short_description,
            categories: published.categories,
            keywords: published.keywords,
            unlisted: published.unlisted.unwrap_or(false),
            versions,
        })
    }
}

/// An installable extension: its id and the OCI reference to pull.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchableExtension {
    pub extension_id: String,
    pub link: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn published(unlisted: Option<bool>) -> PublishedExtension {
        PublishedExtension {
            publisher: Publisher {
                publisher_name: "foo".into(),
                display_name: "Foo Publisher".into(),
            },
            extension_name: "fooName".into(),
            display_name: "Foo".into(),
            short_description: "A foo extension".into(),
            license: "Apache-2.0".into(),
            categories: vec!["Kubernetes".into()],
            keywords: vec![],
            unlisted,
            versions: vec![version("1.0.0", "2023-06-01T10:00:00.000Z", None)],
        }
    }

    fn version(v: &str, last_updated: &str, req: Option<&str>) -> PublishedVersion {
        PublishedVersion {
            version: v.into(),
            preview: false,
            last_updated: last_updated.into(),
            oci_uri: format!("oci-registry.foo/foo/bar:{v}"),
            files: vec![ExtensionFile {
                asset_type: "icon".into(),
                data: "https://example.com/icon.png".into(),
            }],
            podman_desktop_version: req.map(String::from),
        }
    }

    #[test]
    fn unlisted_defaults_to_false() {
        let ext = CatalogExtension::try_from(published(None)).unwrap();
        assert!(!ext.unlisted);
    }

    #[test]
    fn unlisted_flag_is_preserved() {
        assert!(CatalogExtension::try_from(published(Some(true))).unwrap().unlisted);
        assert!(!CatalogExtension::try_from(published(Some(false))).unwrap().unlisted);
    }

    #[test]
    fn id_joins_publisher_and_extension_name() {
        let ext = CatalogExtension::try_from(published(None)).unwrap();
        assert_eq!(ext.id, "foo.fooName");
        assert_eq!(ext.publisher_display_name, "Foo Publisher");
    }

    #[test]
    fn id_does_not_escape_dots() {
        let mut p = published(None);
        p.publisher.publisher_name = "foo.bar".into();
        p.extension_name = "baz".into();
        assert_eq!(CatalogExtension::try_from(p).unwrap().id, "foo.bar.baz");
    }

    #[test]
    fn last_updated_is_parsed() {
        let ext = CatalogExtension::try_from(published(None)).unwrap();
        let expected: Timestamp = "2023-06-01T10:00:00Z".parse().unwrap();
        assert_eq!(ext.versions[0].last_updated, expected);
        assert_eq!(ext.versions[0].files.len(), 1);
    }

    #[test]
    fn invalid_last_updated_is_rejected() {
        let mut p = published(None);
        p.versions[0].last_updated = "yesterday".into();
        let err = CatalogExtension::try_from(p).unwrap_err();
        assert!(err.to_string().contains("foo.fooName@1.0.0"));
    }

    #[test]
    fn latest_version_is_most_recent() {
        let mut p = published(None);
        p.versions = vec![
            version("1.0.0", "2023-01-01T00:00:00Z", None),
            version("1.2.0", "2023-03-01T00:00:00Z", None),
            version("1.1.0", "2023-02-01T00:00:00Z", None),
        ];
        let ext = CatalogExtension::try_from(p).unwrap();
        assert_eq!(ext.latest_version().unwrap().version, "1.2.0");
    }

    #[test]
    fn latest_version_ties_keep_catalog_order() {
        let mut p = published(None);
        p.versions = vec![
            version("2.0.0", "2023-01-01T00:00:00Z", None),
            version("1.0.0", "2023-01-01T00:00:00Z", None),
        ];
        let ext = CatalogExtension::try_from(p).unwrap();
        assert_eq!(ext.latest_version().unwrap().version, "2.0.0");
    }

    #[test]
    fn compatibility_filters_by_host_version() {
        let mut p = published(None);
        p.versions = vec![
            version("1.0.0", "2023-01-01T00:00:00Z", Some(">=1.0.0")),
            version("2.0.0", "2023-06-01T00:00:00Z", Some(">=1.10.0")),
        ];
        let ext = CatalogExtension::try_from(p).unwrap();

        let old_host = semver::Version::new(1, 8, 0);
        let new_host = semver::Version::new(1, 10, 2);
        assert_eq!(ext.latest_compatible_version(&old_host).unwrap().version, "1.0.0");
        assert_eq!(ext.latest_compatible_version(&new_host).unwrap().version, "2.0.0");
    }

    #[test]
    fn unparsable_requirement_is_compatible() {
        let p = PublishedExtension {
            versions: vec![version("1.0.0", "2023-01-01T00:00:00Z", Some("not a range"))],
            ..published(None)
        };
        let ext = CatalogExtension::try_from(p).unwrap();
        assert!(ext.versions[0].is_compatible_with(&semver::Version::new(0, 1, 0)));
    }

    #[test]
    fn fetchable_requires_a_version() {
        let mut p = published(None);
        p.versions.clear();
        let ext = CatalogExtension::try_from(p).unwrap();
        assert!(ext.to_fetchable().is_none());
    }

    #[test]
    fn document_parses_wire_format() {
        let body = r#"{"extensions":[{
            "publisher":{"publisherName":"foo","displayName":"Foo"},
            "extensionName":"fooName","displayName":"Foo","shortDescription":"d",
            "license":"MIT","categories":["a"],"unlisted":true,
            "versions":[{"version":"1.0.0","preview":true,"lastUpdated":"2024-01-01T00:00:00Z",
                "ociUri":"oci-registry.foo/foo/bar","files":[{"assetType":"icon","data":"x"}],
                "podmanDesktopVersion":">=1.5.0"}]}]}"#;
        let doc: CatalogDocument = serde_json::from_str(body).unwrap();
        let p = doc.find("foo.fooName").unwrap();
        assert_eq!(p.unlisted, Some(true));
        assert!(p.versions[0].preview);
        assert_eq!(p.versions[0].podman_desktop_version.as_deref(), Some(">=1.5.0"));
        assert!(doc.find("foo.other").is_none());
    }
}
