#![allow(dead_code)]

use guava_derive::Entity;

#[derive(Entity)]
#[collection(track_timestamps)]
struct Account {
    _id: u32,
}

fn main() {}
