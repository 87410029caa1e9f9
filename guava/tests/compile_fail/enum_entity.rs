#![allow(dead_code)]

use guava_derive::Entity;

#[derive(Entity)]
enum Status {
    Active,
    Banned,
}

fn main() {}
