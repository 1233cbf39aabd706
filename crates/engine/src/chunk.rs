use model::fields::{DATE_RANGE_FIELD, FieldCatalog, PIVOT_VALUES_FIELD};

/// Splits the catalog into request-sized field chunks that preserve catalog
/// order. Every chunk carries the two structural fields so each fragment can
/// be matched back to its siblings; a chunk therefore holds at most
/// `chunk_size + 2` fields.
pub fn chunk_fields(catalog: &FieldCatalog) -> Vec<Vec<String>> {
    catalog
        .fields()
        .chunks(catalog.chunk_size())
        .map(|chunk| {
            let mut fields: Vec<String> = chunk.to_vec();
            for required in [DATE_RANGE_FIELD, PIVOT_VALUES_FIELD] {
                if !fields.iter().any(|f| f == required) {
                    fields.push(required.to_string());
                }
            }
            fields
        })
        .collect()
}
