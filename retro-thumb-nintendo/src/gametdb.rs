//! URL and cache-key helpers for art.gametdb.com.

use retro_thumb_core::{ExtUrl, ImageSizeDef};

const GAMETDB_BASE: &str = "https://art.gametdb.com";

/// One GameTDB artwork file, minus the language folder.
pub(crate) struct ArtPath<'a> {
    pub system: &'a str,
    /// Artwork kind plus size suffix (`"coverM"`, `"disc2"`).
    pub kind: String,
    pub id: &'a str,
    pub ext: &'a str,
}

impl ArtPath<'_> {
    /// `https://art.gametdb.com/{system}/{kind}/{lang}/{id}{ext}`
    pub fn url(&self, lang: &str) -> String {
        format!("{GAMETDB_BASE}/{}", self.cache_key(lang))
    }

    /// Cache key mirroring the URL path.
    pub fn cache_key(&self, lang: &str) -> String {
        format!(
            "{}/{}/{}/{}{}",
            self.system, self.kind, lang, self.id, self.ext
        )
    }

    /// Append one candidate per language.
    pub fn push_urls(
        &self,
        urls: &mut Vec<ExtUrl>,
        languages: &[&str],
        size: &ImageSizeDef,
        high_res: bool,
    ) {
        for lang in languages {
            urls.push(ExtUrl {
                url: self.url(lang),
                cache_key: self.cache_key(lang),
                width: size.width,
                height: size.height,
                high_res,
            });
        }
    }
}

/// GameTDB language folders for a game ID's region character, best first.
pub(crate) fn languages_for_region(region: u8) -> &'static [&'static str] {
    match region {
        b'E' => &["US"],
        b'J' => &["JA"],
        b'D' => &["DE", "EN"],
        b'F' => &["FR", "EN"],
        b'S' => &["ES", "EN"],
        b'I' => &["IT", "EN"],
        b'H' => &["NL", "EN"],
        b'U' => &["AU", "EN"],
        b'K' | b'Q' | b'T' => &["KO", "JA"],
        b'C' | b'W' => &["ZH", "JA"],
        _ => &["EN"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cover() -> ArtPath<'static> {
        ArtPath {
            system: "ds",
            kind: "coverM".to_string(),
            id: "ADME",
            ext: ".jpg",
        }
    }

    #[test]
    fn url_and_key_share_path() {
        let art = cover();
        assert_eq!(art.url("US"), "https://art.gametdb.com/ds/coverM/US/ADME.jpg");
        assert_eq!(art.cache_key("US"), "ds/coverM/US/ADME.jpg");
    }

    #[test]
    fn push_urls_one_per_language() {
        let mut urls = Vec::new();
        let size = ImageSizeDef::new(Some("M"), 400, 352, 2);
        cover().push_urls(&mut urls, &["DE", "EN"], &size, true);
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].cache_key, "ds/coverM/DE/ADME.jpg");
        assert_eq!(urls[1].cache_key, "ds/coverM/EN/ADME.jpg");
        assert!(urls.iter().all(|u| u.high_res && u.width == 400));
    }

    #[test]
    fn region_languages() {
        assert_eq!(languages_for_region(b'E'), &["US"]);
        assert_eq!(languages_for_region(b'D'), &["DE", "EN"]);
        assert_eq!(languages_for_region(b'P'), &["EN"]);
        assert_eq!(languages_for_region(b'?'), &["EN"]);
    }
}
