//! Seed agencies and listings from a YAML file.
//!
//! Records are written under the ids in the file, so re-running a seed
//! replaces the same documents instead of duplicating them.
//!
//! ```yaml
//! agencies:
//!   - id: chatan-homes
//!     name: Chatan Homes
//! listings:
//!   - id: araha-beach-house
//!     title: Araha Beach House
//!     price: 230000
//!     agencyId: chatan-homes
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use okinawa_rentals_core::{Agency, Listing};
use okinawa_rentals_web::db::agencies::AgencyRepository;
use okinawa_rentals_web::db::listings::ListingRepository;
use okinawa_rentals_web::db::{DocumentStore, PgDocumentStore};

use super::{CliError, connect};

/// Seed file contents.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub agencies: Vec<Agency>,
    pub listings: Vec<Listing>,
}

impl SeedFile {
    /// Parse and check a seed file.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Seed` if the YAML does not match the record shapes.
    pub fn parse(content: &str) -> Result<Self, CliError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Problems that would leave dangling or anonymous records.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (i, agency) in self.agencies.iter().enumerate() {
            if agency.id.is_empty() {
                problems.push(format!("agency #{} ({}) has no id", i + 1, agency.name));
            }
        }
        for (i, listing) in self.listings.iter().enumerate() {
            if listing.id.is_empty() {
                problems.push(format!("listing #{} ({}) has no id", i + 1, listing.title));
            }
            if let Some(agency_id) = &listing.agency_id
                && !self.agencies.iter().any(|a| &a.id == agency_id)
            {
                problems.push(format!(
                    "listing {} points at unknown agency {agency_id}",
                    listing.id
                ));
            }
        }
        problems
    }
}

/// Write every record in `seed` to `store`.
///
/// # Errors
///
/// Returns `CliError::Repository` on the first failed write.
pub async fn apply(store: &dyn DocumentStore, seed: &SeedFile) -> Result<(), CliError> {
    let agencies = AgencyRepository::new(store);
    for agency in &seed.agencies {
        agencies.save(agency).await?;
    }
    let listings = ListingRepository::new(store);
    for listing in &seed.listings {
        listings.save(listing).await?;
    }
    info!(
        agencies = seed.agencies.len(),
        listings = seed.listings.len(),
        "Seed applied"
    );
    Ok(())
}

/// Load `file_path` into the database.
///
/// # Errors
///
/// Returns `CliError` if the file cannot be read or parsed, fails validation,
/// or a write fails.
pub async fn run(file_path: &str) -> Result<(), CliError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading seed file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let seed = SeedFile::parse(&content)?;

    let problems = seed.problems();
    if !problems.is_empty() {
        for problem in &problems {
            warn!("  - {problem}");
        }
        return Err(CliError::InvalidSeed(problems.len()));
    }

    let store = PgDocumentStore::new(connect().await?);
    apply(&store, &seed).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use okinawa_rentals_core::{Collection, Query};
    use okinawa_rentals_web::db::MemoryDocumentStore;

    use super::*;

    const SAMPLE: &str = include_str!("../../seed/okinawa.yaml");

    #[test]
    fn test_sample_seed_is_valid() {
        let seed = SeedFile::parse(SAMPLE).unwrap();
        assert!(!seed.agencies.is_empty());
        assert!(!seed.listings.is_empty());
        assert_eq!(seed.problems(), Vec::<String>::new());
    }

    #[test]
    fn test_problems_report_dangling_agency() {
        let seed = SeedFile::parse(
            "listings:\n  - id: l1\n    title: Orphan\n    agencyId: nowhere\n",
        )
        .unwrap();
        assert_eq!(seed.problems(), vec!["listing l1 points at unknown agency nowhere"]);
    }

    #[tokio::test]
    async fn test_apply_is_repeatable() {
        let store = MemoryDocumentStore::new();
        let seed = SeedFile::parse(SAMPLE).unwrap();
        apply(&store, &seed).await.unwrap();
        apply(&store, &seed).await.unwrap();

        let listings = store.count(&Query::new(Collection::Listings)).await.unwrap();
        assert_eq!(listings, seed.listings.len() as u64);

        let first = &seed.listings[0];
        let stored = ListingRepository::new(&store).get(&first.id).await.unwrap().unwrap();
        assert_eq!(stored.title, first.title);
        assert_eq!(stored.kind(), first.kind());
    }
}
