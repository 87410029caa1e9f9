#![allow(dead_code)]

use guava_derive::Entity;

#[derive(Entity)]
struct Anonymous {
    id: u32,
}

fn main() {}
