#![allow(dead_code)]

use serde_derive::Serialize;
use guava_derive::Entity;

#[derive(Serialize, Entity)]
struct Twice {
    #[serde(rename = "_id")]
    id: u32,
    _id: u32,
}

fn main() {}
