// Data Dragon endpoint definitions and URL builders

pub const VERSIONS_ENDPOINT: &str = "https://ddragon.leagueoflegends.com/api/versions.json";
pub const CDN_BASE: &str = "https://ddragon.leagueoflegends.com/cdn";

pub fn champions_url(version: &str) -> String {
    format!("{}/{}/data/en_US/champion.json", CDN_BASE, version)
}

pub fn runes_url(version: &str) -> String {
    format!("{}/{}/data/en_US/runesReforged.json", CDN_BASE, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert_eq!(
            champions_url("14.25.1"),
            "https://ddragon.leagueoflegends.com/cdn/14.25.1/data/en_US/champion.json"
        );
        assert!(runes_url("14.25.1").ends_with("/14.25.1/data/en_US/runesReforged.json"));
    }
}
