use crate::client::OpenStackClient;
use crate::errors::Result;
use flavor_core::{FlavorCollection, FlavorFilter, RawFlavor};
use log::debug;

/// Anything that can produce the raw flavor records of a provider.
#[allow(async_fn_in_trait)]
pub trait FlavorSource {
    async fn list_flavors(&self) -> Result<Vec<RawFlavor>>;
}

impl FlavorSource for OpenStackClient {
    async fn list_flavors(&self) -> Result<Vec<RawFlavor>> {
        OpenStackClient::list_flavors(self).await
    }
}

/// Load every flavor from `source` into a new collection with `filter`.
///
/// The load is all-or-nothing: any retrieval error aborts before a
/// collection exists.
pub async fn load_collection<S: FlavorSource>(
    source: &S,
    filter: FlavorFilter,
) -> Result<FlavorCollection> {
    debug!("getting flavors");
    let records = source.list_flavors().await?;

    let mut flavors = FlavorCollection::new(filter);
    for record in records {
        flavors.add(record);
    }

    debug!("loaded {} flavors", flavors.len());
    Ok(flavors)
}
