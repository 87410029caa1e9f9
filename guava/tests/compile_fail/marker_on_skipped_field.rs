#![allow(dead_code)]

use serde_derive::{ Serialize, Deserialize };
use guava_derive::Entity;

#[derive(Serialize, Deserialize, Entity)]
struct Session {
    _id: u32,
    #[serde(skip)]
    #[unique_index]
    token: String,
}

fn main() {}
