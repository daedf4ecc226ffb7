use super::InfoError;
use roxmltree::Document;

/// First `<entry><title>` in an Atom feed whose title contains `region`. Feeds list the
/// newest entry first, so the first hit is the latest.
pub fn latest_matching_entry(xml: &str, region: &str) -> Result<Option<String>, InfoError> {
    let doc = Document::parse(xml).map_err(|e| InfoError::Feed(e.to_string()))?;
    let title = doc
        .root_element()
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "entry")
        .filter_map(|entry| {
            entry
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == "title")
                .and_then(|t| t.text())
        })
        .find(|title| title.contains(region))
        .map(|title| title.trim().to_string());
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>USGS Magnitude 2.5+ Earthquakes, Past Day</title>
  <entry>
    <title>M 4.6 - 20 km SW of Lima, Peru</title>
    <summary type="html">peru</summary>
  </entry>
  <entry>
    <title>M 5.1 - 35 km W of Ovalle, Chile</title>
    <summary type="html">first</summary>
  </entry>
  <entry>
    <title>M 3.2 - 10 km N of Calama, Chile</title>
  </entry>
</feed>"#;

    #[test]
    fn first_matching_entry_wins() {
        assert_eq!(
            latest_matching_entry(FEED, "Chile").unwrap().as_deref(),
            Some("M 5.1 - 35 km W of Ovalle, Chile")
        );
    }

    #[test]
    fn feed_title_is_not_an_entry() {
        assert_eq!(latest_matching_entry(FEED, "USGS").unwrap(), None);
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(latest_matching_entry(FEED, "Japan").unwrap(), None);
    }

    #[test]
    fn malformed_xml_is_feed_error() {
        assert!(matches!(
            latest_matching_entry("<feed><entry>", "Chile"),
            Err(InfoError::Feed(_))
        ));
    }
}
