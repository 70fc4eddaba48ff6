pub const PLANT_IDENTIFICATION: &str = include_str!("../data/prompts/plant_identification.txt");
