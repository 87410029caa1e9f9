#![allow(dead_code)]

use guava_derive::Entity;

#[derive(Entity)]
struct User {
    _id: u32,
    #[lowercase]
    #[uppercase]
    email: String,
}

fn main() {}
