pub mod bitrix;
