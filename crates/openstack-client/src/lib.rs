//! OpenStack service clients
//!
//! Thin clients for the three services the cluster driver talks to:
//!
//! - **Identity** (Keystone): application credentials handed to workload clusters
//! - **Key manager** (Barbican): cluster certificate authorities
//! - **Image** (Glance): resolving machine images by id or name
//!
//! All three share one [`Session`], which authenticates with an application
//! credential and caches the issued token. Calls made for a user pass a
//! [`RequestContext`] carrying that user's token.
//!
//! # Example
//!
//! ```no_run
//! use openstack_client::{ImageClient, ImageClientTrait, RequestContext, Session};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Arc::new(Session::new(
//!     reqwest::Client::new(),
//!     "https://keystone.example:5000/v3",
//!     "credential-id",
//!     "credential-secret",
//! ));
//! let images = ImageClient::new(session, "https://glance.example:9292");
//! let image = images.resolve_image(&RequestContext::service(), "ubuntu-jammy-kube-v1.28.0").await?;
//! println!("{}", image.id);
//! # Ok(())
//! # }
//! ```

pub mod certificate;
pub mod context;
pub mod error;
pub mod identity;
pub mod image;
pub mod models;
pub mod session;
#[path = "trait.rs"]
pub mod openstack_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use certificate::CertificateClient;
pub use context::RequestContext;
pub use error::OpenStackError;
pub use identity::IdentityClient;
pub use image::ImageClient;
pub use models::{ApplicationCredential, CertificateAuthority, Image};
pub use openstack_trait::{CertificateClientTrait, IdentityClientTrait, ImageClientTrait};
pub use session::Session;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockOpenStackClient;
