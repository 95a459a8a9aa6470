use cardlist_scraping::{
    config::Config,
    ingest::{ingest_html, IngestError, IngestOptions},
    language::LanguageCode,
    schema::ArtworkKind,
    store::{InMemoryStore, SeriesStore, StoreError},
};
use itertools::Itertools;

const PAGE: &str = r#"<html><body>
<p>Set list of Battles of Legend: Monster Mayhem.</p>
<table class="wikitable sortable card-list">
<tbody>
<tr><th>Card number</th><th>English name</th><th>French name</th><th>Rarity</th><th>Category</th><th>Print</th></tr>
<tr>
  <td><a href="/wiki/BLMM-FR001">BLMM-FR001</a></td>
  <td>"<a href="/wiki/Blue-Eyes_White_Dragon">Blue-Eyes White Dragon</a>"</td>
  <td><span lang="fr">"Dragon Blanc aux Yeux Bleus"</span></td>
  <td><a href="/wiki/Secret_Rare">Secret Rare</a><br><a href="/wiki/Starlight_Rare">Starlight Rare</a></td>
  <td><a href="/wiki/Normal_Monster">Normal Monster</a></td>
  <td>New artwork</td>
</tr>
<tr>
  <td>BLMM-FR002</td>
  <td>"Dark Magician (Alternate Artwork)"</td>
  <td>"Magicien Sombre"</td>
  <td><a href="/wiki/Secret_Rare">Secret Rare</a></td>
  <td>Normal Monster</td>
</tr>
<tr>
  <td>BLMM-FR002</td>
  <td>"Dark Magician"</td>
  <td>"Magicien Sombre"</td>
  <td><a href="/wiki/Ultra_Rare">Ultra Rare</a><a href="/wiki/Secret_Rare">Secret Rare</a></td>
  <td>Normal Monster</td>
</tr>
<tr>
  <td>BLMM-FR003</td>
  <td>"Pot of Greed"</td>
  <td>"Pot de Cupidité"</td>
  <td></td>
  <td>Spell Card</td>
</tr>
<tr>
  <td> </td>
  <td>"Nameless"</td>
  <td></td>
  <td><a href="/wiki/Common">Common</a></td>
</tr>
</tbody>
</table>
</body></html>"#;

#[test]
fn page_to_store() {
    let config = Config::load(None).unwrap();
    let options = IngestOptions::from_config(config.ingest(), None);
    let outcome = ingest_html(PAGE, &options).unwrap();

    assert_eq!(outcome.entries().len(), 5);
    assert_eq!(outcome.language(), LanguageCode::Fr);
    assert_eq!(outcome.detection().confidence(), 1.0);

    let statistics = outcome.statistics();
    assert_eq!(statistics.unique_codes(), 2);
    assert_eq!(statistics.duplicates(), 3);
    assert_eq!(statistics.rarity_counts()["Secret Rare"], 3);

    let groups = outcome.groups();
    assert_eq!(
        groups
            .values()
            .map(|g| (g.code().as_str(), g.artwork(), g.rarities().len()))
            .collect_vec(),
        [
            ("BLMM-FR001", ArtworkKind::New, 2),
            ("BLMM-FR002", ArtworkKind::Alternative, 1),
            ("BLMM-FR002", ArtworkKind::None, 2),
        ]
    );
    assert_eq!(groups[1].name_english(), "Dark Magician");

    let mut store = InMemoryStore::default();
    let report = outcome.submit(&mut store, Some("Monster Mayhem"), None).unwrap();
    assert_eq!(report.cards_created(), 3);
    assert_eq!(report.rarities_processed(), 3);
    assert_eq!(report.links_created(), 5);

    let series = store.find_series("BLMM", LanguageCode::Fr).unwrap();
    assert_eq!(series, report.series());
    assert_eq!(
        store
            .cards_of(series)
            .map(|card| card.name().as_str())
            .collect_vec(),
        ["Dragon Blanc aux Yeux Bleus", "Magicien Sombre", "Magicien Sombre"]
    );

    let json = serde_json::to_string(&store).unwrap();
    let mut reloaded: InMemoryStore = serde_json::from_str(&json).unwrap();
    assert!(matches!(
        outcome.submit(&mut reloaded, None, None),
        Err(IngestError::Store(StoreError::SeriesConflict { .. }))
    ));
    assert_eq!(reloaded.links().len(), 5);
}

#[test]
fn page_without_rows() {
    let page = "<table><tbody><tr><th>Card number</th><th>English name</th></tr></tbody></table>";
    assert!(matches!(
        ingest_html(page, &IngestOptions::default()),
        Err(IngestError::NothingExtracted)
    ));
}
