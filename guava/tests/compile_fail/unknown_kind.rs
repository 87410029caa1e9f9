#![allow(dead_code)]

use guava_derive::Entity;

#[derive(Entity)]
struct Shop {
    _id: u32,
    #[geospatial_index(kind = "3D")]
    location: Vec<f64>,
}

fn main() {}
