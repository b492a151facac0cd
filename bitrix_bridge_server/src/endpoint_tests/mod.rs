mod mocks;
mod webhook;
