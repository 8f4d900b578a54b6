//! PokeAPI response models and client
//!
//! Only the fields the commands actually read are modelled; serde ignores the
//! rest of each (very large) response.

pub mod client;

pub use client::{ApiError, PokeApiClient, POKEAPI_BASE_URL};

use serde::{Deserialize, Serialize};

/// A name plus the URL of the full resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

/// One page of the location area listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationAreaPage {
    /// Total number of location areas
    pub count: u32,
    /// URL of the next page, absent on the last page
    pub next: Option<String>,
    /// URL of the previous page, absent on the first page
    pub previous: Option<String>,
    /// Location areas on this page
    pub results: Vec<NamedResource>,
}

/// A location area with the Pokemon that can be encountered there
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationArea {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub pokemon_encounters: Vec<PokemonEncounter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonEncounter {
    pub pokemon: NamedResource,
}

/// A single Pokemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Drives the catch roll; some forms report null
    pub base_experience: Option<u32>,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonStat {
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PokemonType {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_area_page_parses_null_cursors() {
        let json = r#"{
            "count": 1089,
            "next": "https://pokeapi.co/api/v2/location-area/?offset=20&limit=20",
            "previous": null,
            "results": [
                {"name": "canalave-city-area", "url": "https://pokeapi.co/api/v2/location-area/1/"},
                {"name": "eterna-city-area", "url": "https://pokeapi.co/api/v2/location-area/2/"}
            ]
        }"#;

        let page: LocationAreaPage = serde_json::from_str(json).expect("page should parse");

        assert_eq!(page.count, 1089);
        assert!(page.next.is_some());
        assert!(page.previous.is_none());
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].name, "canalave-city-area");
    }

    #[test]
    fn test_location_area_ignores_unknown_fields() {
        let json = r#"{
            "id": 1,
            "name": "canalave-city-area",
            "game_index": 1,
            "encounter_method_rates": [],
            "pokemon_encounters": [
                {"pokemon": {"name": "tentacool", "url": "u"}, "version_details": []}
            ]
        }"#;

        let area: LocationArea = serde_json::from_str(json).expect("area should parse");

        assert_eq!(area.pokemon_encounters.len(), 1);
        assert_eq!(area.pokemon_encounters[0].pokemon.name, "tentacool");
    }

    #[test]
    fn test_pokemon_type_field_is_renamed() {
        let json = r#"{
            "id": 25,
            "name": "pikachu",
            "base_experience": null,
            "height": 4,
            "weight": 60,
            "stats": [{"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": "u"}}],
            "types": [{"slot": 1, "type": {"name": "electric", "url": "u"}}]
        }"#;

        let pokemon: Pokemon = serde_json::from_str(json).expect("pokemon should parse");

        assert!(pokemon.base_experience.is_none());
        assert_eq!(pokemon.stats[0].stat.name, "hp");
        assert_eq!(pokemon.stats[0].base_stat, 35);
        assert_eq!(pokemon.types[0].kind.name, "electric");
    }
}
