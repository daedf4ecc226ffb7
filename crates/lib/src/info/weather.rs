use super::InfoError;
use reqwest::Url;

/// wttr.in one-line format: condition, humidity, temperature, feels-like, resolved place.
const REPORT_FORMAT: &str = "%x Humedad:%h Temp:%t Sensación:%f Lugar:%l";
const REPORT_LANG: &str = "es";

/// `{base}/{location}?format=...&lang=es`, with the location percent-encoded as a path segment.
pub(super) fn report_url(base_url: &str, location: &str) -> Result<Url, InfoError> {
    let mut url = Url::parse(base_url).map_err(|e| InfoError::Url(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| InfoError::Url(format!("{} cannot be a base", base_url)))?
        .pop_if_empty()
        .push(location);
    url.query_pairs_mut()
        .append_pair("format", REPORT_FORMAT)
        .append_pair("lang", REPORT_LANG);
    Ok(url)
}
