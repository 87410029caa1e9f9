#![allow(dead_code)]

use serde_derive::{ Serialize, Deserialize };
use std::collections::HashMap;
use guava_derive::Entity;

#[derive(Serialize, Deserialize, Entity)]
struct Profile {
    _id: u32,
    #[serde(flatten)]
    #[lowercase]
    extra: HashMap<String, String>,
}

fn main() {}
