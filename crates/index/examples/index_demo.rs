use index::{
    BackendConfig, Category, CollectionIndex, IndexConfig, Item, ItemId, Payload, PayloadFilter,
    VectorStore,
};

fn main() -> anyhow::Result<()> {
    std::fs::create_dir_all("data")?;

    let cfg = IndexConfig::new().with_backend(BackendConfig::redb("data/outfits.redb"));
    let index = CollectionIndex::new(cfg)?;

    // Two wardrobe pieces and one marketplace listing in a toy 3-d space.
    let seed = [
        ("wardrobe", "oxford", [0.9, 0.1, 0.2], Category::Top, "Oxford shirt"),
        ("wardrobe", "chinos", [0.8, 0.3, 0.1], Category::Bottom, "Beige chinos"),
        ("marketplace", "overshirt", [0.7, 0.2, 0.4], Category::Top, "Linen overshirt"),
    ];
    for (collection, id, vector, category, name) in seed {
        let payload = Payload::garment(format!("img/{id}.jpg"), category).with_product_name(name);
        index.upsert(collection, Item::new(ItemId::from(id), vector.to_vec(), payload))?;
    }
    println!("Inserted {} items.", seed.len());

    // Tops near the chinos, in both collections.
    let chinos = index
        .retrieve("wardrobe", &ItemId::from("chinos"))?
        .ok_or_else(|| anyhow::anyhow!("chinos vanished"))?;
    let tops = PayloadFilter::category(Category::Top);
    for collection in ["wardrobe", "marketplace"] {
        for hit in index.query(collection, &chinos.vector, &tops, 2)? {
            println!(
                "{collection}: {} ({:.3}) {}",
                hit.item.id,
                hit.score,
                hit.item.payload.label().unwrap_or("-")
            );
        }
    }

    Ok(())
}
