//! Demo store list for a fresh local database.

use newman_core::store::NewStore;

const DEMO_STORES: &[(&str, &str, &str, &str)] = &[
  ("ST001", "Bristol Broadmead", "South West", "BS1 3XE"),
  ("ST002", "Cardiff Queen Street", "Wales", "CF10 2BH"),
  ("ST003", "Leeds Briggate", "North East", "LS1 6HD"),
  ("ST004", "Manchester Arndale", "North West", "M4 3AQ"),
  ("ST005", "Birmingham Bullring", "Midlands", "B5 4BU"),
  ("ST006", "Glasgow Buchanan Street", "Scotland", "G1 2FF"),
  ("ST007", "Norwich Castle Quarter", "East", "NR1 3DD"),
  ("ST008", "Brighton Churchill Square", "South East", "BN1 2RG"),
];

pub fn demo_stores() -> Vec<NewStore> {
  DEMO_STORES
    .iter()
    .map(|&(code, name, area, postcode)| NewStore {
      area: Some(area.to_owned()),
      status: Some("open".to_owned()),
      postcode: Some(postcode.to_owned()),
      ..NewStore::new(code, name)
    })
    .collect()
}
