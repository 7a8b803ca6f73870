//! Franchise tables: canonical 3-letter codes, feed display names, and the
//! free-form alias resolver used by the query router.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Every franchise code the roster sync walks. Includes ARI alongside UTA so
/// historical rows keep resolving.
pub const TEAM_CODES: [&str; 33] = [
    "ANA", "ARI", "BOS", "BUF", "CGY", "CAR", "CHI", "COL", "CBJ", "DAL", "DET", "EDM", "FLA",
    "LAK", "MIN", "MTL", "NSH", "NJD", "NYI", "NYR", "OTT", "PHI", "PIT", "SJS", "SEA", "STL",
    "TBL", "TOR", "UTA", "VAN", "VGK", "WSH", "WPG",
];

/// Full display names as the stats and injury feeds spell them.
static DISPLAY_NAMES: &[(&str, &str)] = &[
    ("Anaheim Ducks", "ANA"),
    ("Arizona Coyotes", "ARI"),
    ("Boston Bruins", "BOS"),
    ("Buffalo Sabres", "BUF"),
    ("Calgary Flames", "CGY"),
    ("Carolina Hurricanes", "CAR"),
    ("Chicago Blackhawks", "CHI"),
    ("Colorado Avalanche", "COL"),
    ("Columbus Blue Jackets", "CBJ"),
    ("Dallas Stars", "DAL"),
    ("Detroit Red Wings", "DET"),
    ("Edmonton Oilers", "EDM"),
    ("Florida Panthers", "FLA"),
    ("Los Angeles Kings", "LAK"),
    ("Minnesota Wild", "MIN"),
    ("Montreal Canadiens", "MTL"),
    ("Montréal Canadiens", "MTL"),
    ("Nashville Predators", "NSH"),
    ("New Jersey Devils", "NJD"),
    ("New York Islanders", "NYI"),
    ("New York Rangers", "NYR"),
    ("Ottawa Senators", "OTT"),
    ("Philadelphia Flyers", "PHI"),
    ("Pittsburgh Penguins", "PIT"),
    ("San Jose Sharks", "SJS"),
    ("Seattle Kraken", "SEA"),
    ("St. Louis Blues", "STL"),
    ("Tampa Bay Lightning", "TBL"),
    ("Toronto Maple Leafs", "TOR"),
    ("Utah Hockey Club", "UTA"),
    ("Utah Mammoth", "UTA"),
    ("Vancouver Canucks", "VAN"),
    ("Vegas Golden Knights", "VGK"),
    ("Washington Capitals", "WSH"),
    ("Winnipeg Jets", "WPG"),
];

static DISPLAY_NAME_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| DISPLAY_NAMES.iter().copied().collect());

/// Lowercased informal aliases: cities, nicknames, shorthands.
static ALIASES: &[(&str, &str)] = &[
    ("toronto", "TOR"),
    ("maple leafs", "TOR"),
    ("leafs", "TOR"),
    ("montreal", "MTL"),
    ("canadiens", "MTL"),
    ("habs", "MTL"),
    ("ottawa", "OTT"),
    ("senators", "OTT"),
    ("sens", "OTT"),
    ("boston", "BOS"),
    ("bruins", "BOS"),
    ("buffalo", "BUF"),
    ("sabres", "BUF"),
    ("detroit", "DET"),
    ("red wings", "DET"),
    ("florida", "FLA"),
    ("panthers", "FLA"),
    ("tampa", "TBL"),
    ("tampa bay", "TBL"),
    ("lightning", "TBL"),
    ("carolina", "CAR"),
    ("hurricanes", "CAR"),
    ("canes", "CAR"),
    ("new jersey", "NJD"),
    ("devils", "NJD"),
    ("new york rangers", "NYR"),
    ("rangers", "NYR"),
    ("new york islanders", "NYI"),
    ("islanders", "NYI"),
    ("philadelphia", "PHI"),
    ("flyers", "PHI"),
    ("pittsburgh", "PIT"),
    ("penguins", "PIT"),
    ("pens", "PIT"),
    ("washington", "WSH"),
    ("capitals", "WSH"),
    ("caps", "WSH"),
    ("columbus", "CBJ"),
    ("blue jackets", "CBJ"),
    ("chicago", "CHI"),
    ("blackhawks", "CHI"),
    ("hawks", "CHI"),
    ("colorado", "COL"),
    ("avalanche", "COL"),
    ("avs", "COL"),
    ("dallas", "DAL"),
    ("stars", "DAL"),
    ("minnesota", "MIN"),
    ("wild", "MIN"),
    ("nashville", "NSH"),
    ("predators", "NSH"),
    ("preds", "NSH"),
    ("st louis", "STL"),
    ("st. louis", "STL"),
    ("blues", "STL"),
    ("winnipeg", "WPG"),
    ("jets", "WPG"),
    ("arizona", "ARI"),
    ("coyotes", "ARI"),
    ("utah", "UTA"),
    ("utah hockey club", "UTA"),
    ("mammoth", "UTA"),
    ("anaheim", "ANA"),
    ("ducks", "ANA"),
    ("calgary", "CGY"),
    ("flames", "CGY"),
    ("edmonton", "EDM"),
    ("oilers", "EDM"),
    ("los angeles", "LAK"),
    ("kings", "LAK"),
    ("san jose", "SJS"),
    ("sharks", "SJS"),
    ("seattle", "SEA"),
    ("kraken", "SEA"),
    ("vancouver", "VAN"),
    ("canucks", "VAN"),
    ("vegas", "VGK"),
    ("golden knights", "VGK"),
    ("knights", "VGK"),
];

static ALIAS_MAP: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| ALIASES.iter().copied().collect());

/// Resolve a feed display name ("Toronto Maple Leafs") to its code.
pub fn code_for_display_name(name: &str) -> Option<&'static str> {
    DISPLAY_NAME_MAP.get(name).copied()
}

/// Resolve free-form user input to a franchise code.
///
/// Tries, in order: exact alias match, a literal 3-letter code, then
/// partial alias containment in either direction.
pub fn normalize_team(input: &str) -> Option<String> {
    let lower = input.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    if let Some(code) = ALIAS_MAP.get(lower.as_str()) {
        return Some((*code).to_string());
    }
    if input.trim().len() == 3 && input.trim().chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(input.trim().to_uppercase());
    }
    for (alias, code) in ALIASES {
        if lower.contains(alias) || alias.contains(lower.as_str()) {
            return Some((*code).to_string());
        }
    }
    None
}

/// Normalize a list of user-supplied team references, dropping unknowns.
pub fn normalize_teams(teams: &[String]) -> Vec<String> {
    teams.iter().filter_map(|t| normalize_team(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_franchise_has_an_informal_alias() {
        // One representative informal alias (city, nickname, or shorthand)
        // per active franchise.
        let samples = [
            ("ducks", "ANA"),
            ("bruins", "BOS"),
            ("sabres", "BUF"),
            ("flames", "CGY"),
            ("canes", "CAR"),
            ("hawks", "CHI"),
            ("avs", "COL"),
            ("blue jackets", "CBJ"),
            ("stars", "DAL"),
            ("red wings", "DET"),
            ("oilers", "EDM"),
            ("panthers", "FLA"),
            ("kings", "LAK"),
            ("wild", "MIN"),
            ("habs", "MTL"),
            ("preds", "NSH"),
            ("devils", "NJD"),
            ("islanders", "NYI"),
            ("rangers", "NYR"),
            ("sens", "OTT"),
            ("flyers", "PHI"),
            ("pens", "PIT"),
            ("sharks", "SJS"),
            ("kraken", "SEA"),
            ("blues", "STL"),
            ("lightning", "TBL"),
            ("leafs", "TOR"),
            ("mammoth", "UTA"),
            ("canucks", "VAN"),
            ("knights", "VGK"),
            ("caps", "WSH"),
            ("jets", "WPG"),
        ];
        assert_eq!(samples.len(), 32);
        for (alias, code) in samples {
            assert_eq!(
                normalize_team(alias).as_deref(),
                Some(code),
                "alias {alias} should resolve to {code}"
            );
        }
    }

    #[test]
    fn three_letter_codes_pass_through_uppercased() {
        assert_eq!(normalize_team("tor").as_deref(), Some("TOR"));
        assert_eq!(normalize_team("VGK").as_deref(), Some("VGK"));
    }

    #[test]
    fn partial_matches_resolve() {
        assert_eq!(normalize_team("the maple leafs").as_deref(), Some("TOR"));
        assert_eq!(normalize_team("golden knights hockey").as_deref(), Some("VGK"));
    }

    #[test]
    fn unknown_input_is_dropped() {
        assert_eq!(normalize_team(""), None);
        assert_eq!(normalize_team("cricket club"), None);
    }

    #[test]
    fn feed_display_names_cover_relocations() {
        assert_eq!(code_for_display_name("Utah Hockey Club"), Some("UTA"));
        assert_eq!(code_for_display_name("Utah Mammoth"), Some("UTA"));
        assert_eq!(code_for_display_name("Montréal Canadiens"), Some("MTL"));
        assert_eq!(code_for_display_name("Springfield Indians"), None);
    }
}
